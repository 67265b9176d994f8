//! Fuzz target for prefix and identifier validation.
//!
//! Tests that validation handles arbitrary input safely and consistently.

#![no_main]

use libfuzzer_sys::fuzz_target;
use storyguard_identity::{PersonalId, ValidPrefix};

fuzz_target!(|data: &[u8]| {
    // Try to interpret input as a string
    if let Ok(s) = std::str::from_utf8(data) {
        // Attempt prefix validation
        // Should succeed or fail predictably - never panic
        if let Ok(prefix) = ValidPrefix::new(s) {
            // Normalized prefix is uppercase and 4 characters
            assert_eq!(prefix.as_str().len(), 4);
            assert_eq!(prefix.as_str(), s.to_ascii_uppercase());
        }

        // Attempt whole-identifier validation
        if let Ok(id) = PersonalId::new(s) {
            // Normalized identifier is uppercase and 6 characters
            assert_eq!(id.as_str().len(), 6);
            assert_eq!(id.as_str(), s.to_ascii_uppercase());
            assert_eq!(id.prefix().len(), 4);
            assert_eq!(id.suffix().len(), 2);
        }
    }
});

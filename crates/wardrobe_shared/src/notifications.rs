//! Notification template ids posted to the user-facing notification sink.

/// A worn asset could not be fetched and was replaced by a new default.
pub const REPLACED_MISSING_WEARABLE: &str = "ReplacedMissingWearable";

/// A wearable with unsaved edits is about to be taken off.
pub const WEARABLE_SAVE: &str = "WearableSave";

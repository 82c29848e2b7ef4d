//! Runnable demos for `academy-reco`. See the `[[example]]` targets.

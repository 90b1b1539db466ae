//! Property tests for classification, idempotence and drift atomicity

use dep_patcher::{apply_edits, plan, Edit, EditState, Mode, PatchError};
use proptest::prelude::*;
use std::fs;

proptest! {
    #[test]
    fn apply_twice_equals_apply_once(
        prefix in "[a-d \n]{0,40}",
        suffix in "[a-d \n]{0,40}",
        anchor in "[a-z]{1,8}",
        replacement in "[a-z ]{1,12}",
    ) {
        prop_assume!(!anchor.contains(&replacement));
        let edits = [Edit::new(anchor.clone(), replacement)];
        let content = format!("{prefix}{anchor}{suffix}");

        let once = plan(&content, &edits).unwrap();
        let twice = plan(&once.content, &edits).unwrap();

        prop_assert!(twice.is_noop());
        prop_assert_eq!(twice.content, once.content);
    }

    #[test]
    fn anchor_without_replacement_is_pristine(
        prefix in "[a-c]{0,30}",
        suffix in "[a-c]{0,30}",
        anchor in "x[a-c]{0,4}",
        replacement in "y[a-c]{0,4}",
    ) {
        let edit = Edit::new(anchor.clone(), replacement);
        let content = format!("{prefix}{anchor}{suffix}");
        prop_assert_eq!(edit.classify(&content), EditState::Pristine);
    }

    #[test]
    fn replacement_present_is_already_applied(
        prefix in "[a-c]{0,30}",
        suffix in "[a-c]{0,30}",
        anchor in "x[a-c]{0,4}",
        replacement in "y[a-c]{0,4}",
    ) {
        let edit = Edit::new(anchor, replacement.clone());
        let content = format!("{prefix}{replacement}{suffix}");
        prop_assert_eq!(edit.classify(&content), EditState::AlreadyApplied);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn drift_leaves_file_byte_identical(
        content in "[a-c \n]{0,60}",
        good_anchor in "[a-c]{1,3}",
        missing_anchor in "x[a-c]{0,4}",
        missing_replacement in "y[a-c]{0,4}",
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.js");
        let content = format!("{good_anchor}{content}");
        fs::write(&path, &content).unwrap();

        // the first edit would apply; the second has drifted
        let edits = vec![
            Edit::new(good_anchor, "z"),
            Edit::new(missing_anchor, missing_replacement),
        ];
        let result = apply_edits(&path, &edits, Mode::Apply);

        let is_drift = matches!(result, Err(PatchError::Drifted { index: 1, .. }));
        prop_assert!(is_drift);
        prop_assert_eq!(fs::read(&path).unwrap(), content.into_bytes());
        prop_assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}

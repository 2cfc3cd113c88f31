mod common;

use activity_importer::pipeline::duplicate::{find_duplicate, normalize_type_key};
use activity_importer::types::import::{DuplicateCandidate, ExistingActivity};
use common::at;
use uuid::Uuid;

fn existing() -> ExistingActivity {
    ExistingActivity {
        id: Uuid::new_v4(),
        start_time: Some(at(0)),
        end_time: Some(at(3600)),
        activity_type_key: Some("running".to_string()),
        sample_count: 240,
    }
}

fn candidate() -> DuplicateCandidate {
    DuplicateCandidate {
        user_id: Uuid::new_v4(),
        date: at(0).date_naive(),
        activity_type_key: Some("running".to_string()),
        start_time: Some(at(0)),
        end_time: Some(at(3600)),
        sample_count: 240,
    }
}

#[test]
fn matching_candidate_is_a_duplicate() {
    let existing = vec![existing()];
    let found = find_duplicate(&existing, &candidate()).expect("duplicate");
    assert_eq!(found.id, existing[0].id);
}

#[test]
fn candidate_without_start_time_is_never_a_duplicate() {
    let mut c = candidate();
    c.start_time = None;

    let mut untracked = existing();
    untracked.start_time = None;
    assert_eq!(find_duplicate(&[existing(), untracked], &c), None);
}

#[test]
fn sub_second_differences_still_match() {
    let mut c = candidate();
    c.start_time = Some(at(0) + chrono::Duration::milliseconds(400));
    assert!(find_duplicate(&[existing()], &c).is_some());
}

#[test]
fn changing_any_compared_field_breaks_the_match() {
    let existing = [existing()];

    let mut c = candidate();
    c.start_time = Some(at(1));
    assert_eq!(find_duplicate(&existing, &c), None);

    let mut c = candidate();
    c.activity_type_key = Some("cycling".to_string());
    assert_eq!(find_duplicate(&existing, &c), None);

    let mut c = candidate();
    c.end_time = Some(at(3601));
    assert_eq!(find_duplicate(&existing, &c), None);

    let mut c = candidate();
    c.sample_count = 239;
    assert_eq!(find_duplicate(&existing, &c), None);
}

#[test]
fn end_time_on_only_one_side_is_not_a_duplicate() {
    let mut c = candidate();
    c.end_time = None;
    assert_eq!(find_duplicate(&[existing()], &c), None);

    let mut open_ended = existing();
    open_ended.end_time = None;
    assert_eq!(find_duplicate(&[open_ended.clone()], &candidate()), None);

    // neither side has one
    assert!(find_duplicate(&[open_ended], &c).is_some());
}

#[test]
fn later_existing_activity_can_match() {
    let mut other = existing();
    other.start_time = Some(at(-7200));
    let target = existing();

    let list = [other, target.clone()];
    assert_eq!(find_duplicate(&list, &candidate()).map(|a| a.id), Some(target.id));
}

#[test]
fn type_keys_are_normalized() {
    assert_eq!(normalize_type_key("Running").as_deref(), Some("running"));
    assert_eq!(normalize_type_key("E Biking").as_deref(), Some("e_biking"));
    assert_eq!(normalize_type_key("Stand-Up  Paddleboarding").as_deref(), Some("stand_up_paddleboarding"));
    assert_eq!(normalize_type_key("_trail__run!_").as_deref(), Some("trail_run"));
    assert_eq!(normalize_type_key("   "), None);
    assert_eq!(normalize_type_key("!!"), None);
}

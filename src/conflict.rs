use crate::models::Event;
use crate::utils::time::format_range;
use chrono_tz::Tz;

/// Check a candidate event against existing events for time conflicts.
///
/// Two events conflict when their intervals strictly overlap:
/// `candidate.start < existing.end && candidate.end > existing.start`.
/// Touching endpoints do not conflict. The candidate itself (matched by id)
/// is skipped. Returns one localized description per conflicting event, in
/// the order the existing events were given.
pub fn check_conflicts(candidate: &Event, existing: &[Event], tz: Tz) -> Vec<String> {
    let mut conflicts = Vec::new();

    for event in existing {
        if event.id == candidate.id {
            continue;
        }

        if candidate.start < event.end && candidate.end > event.start {
            conflicts.push(
                t!(
                    "conflict.overlap",
                    title = event.title,
                    range = format_range(event.start, event.end, tz)
                )
                .into_owned(),
            );
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 15, hour, minute, 0).unwrap()
    }

    fn event(id: &str, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            start,
            end,
            color: None,
            location: None,
        }
    }

    #[test]
    fn overlapping_event_reports_one_conflict() {
        rust_i18n::set_locale("en");
        let lunch = event("1", "Lunch", at(12, 0), at(13, 0));
        let candidate = event("2", "Call", at(12, 30), at(13, 30));

        let conflicts = check_conflicts(&candidate, &[lunch], Tz::UTC);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].contains("Lunch"));
        assert!(conflicts[0].contains("12:00 - 13:00"));
    }

    #[test]
    fn touching_endpoints_do_not_conflict() {
        let existing = event("1", "Lunch", at(11, 0), at(12, 0));
        let candidate = event("2", "Call", at(12, 0), at(13, 0));

        assert!(check_conflicts(&candidate, &[existing.clone()], Tz::UTC).is_empty());

        // And the other boundary
        let candidate = event("3", "Brunch", at(10, 0), at(11, 0));
        assert!(check_conflicts(&candidate, &[existing], Tz::UTC).is_empty());
    }

    #[test]
    fn candidate_is_skipped_by_id() {
        let existing = event("same", "Lunch", at(12, 0), at(13, 0));
        let candidate = event("same", "Lunch", at(12, 0), at(13, 0));

        assert!(check_conflicts(&candidate, &[existing], Tz::UTC).is_empty());
    }

    #[test]
    fn containment_counts_as_overlap() {
        let existing = event("1", "Workshop", at(9, 0), at(17, 0));
        let candidate = event("2", "Break", at(12, 0), at(12, 30));

        assert_eq!(check_conflicts(&candidate, &[existing], Tz::UTC).len(), 1);
    }

    #[test]
    fn conflicts_follow_input_order() {
        rust_i18n::set_locale("en");
        let a = event("1", "First", at(12, 0), at(13, 0));
        let b = event("2", "Second", at(12, 30), at(13, 30));
        let candidate = event("3", "Call", at(12, 15), at(13, 15));

        let conflicts = check_conflicts(&candidate, &[a, b], Tz::UTC);
        assert_eq!(conflicts.len(), 2);
        assert!(conflicts[0].contains("First"));
        assert!(conflicts[1].contains("Second"));
    }

    #[test]
    fn same_day_without_overlap_does_not_conflict() {
        let existing = event("1", "Morning run", at(7, 0), at(8, 0));
        let candidate = event("2", "Dinner", at(18, 0), at(19, 0));

        assert!(check_conflicts(&candidate, &[existing], Tz::UTC).is_empty());
    }
}

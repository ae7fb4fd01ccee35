use super::*;
use proptest::prelude::*;

proptest! {
    /// A freshly created wisdom is always queued, whatever its content
    #[test]
    fn prop_w1_1_new_is_queued(
        text in "\\PC+",
        source in proptest::option::of("\\PC*"),
        category in "[A-Za-z ]{1,20}",
        position in 0..10_000i32,
    ) {
        let wisdom = Wisdom::new(text.clone(), source.clone(), category.clone(), position);

        prop_assert_eq!(wisdom.get_state(), CycleState::Queued);
        prop_assert_eq!(wisdom.get_text(), text);
        prop_assert_eq!(wisdom.get_source(), source);
        prop_assert_eq!(wisdom.get_category(), category);
        prop_assert_eq!(wisdom.get_queue_position(), position);
        prop_assert_eq!(wisdom.get_exposures_total(), 0);
    }

    /// remaining_today never goes negative and never exceeds the daily target
    #[test]
    fn prop_w1_2_remaining_today_bounds(
        is_active in any::<bool>(),
        day in 0..=CYCLE_DAYS,
        exposures in 0..200i32,
    ) {
        let wisdom = Wisdom::new("t".to_string(), None, "General".to_string(), 0)
            .with_progress(is_active, day, exposures);

        let remaining = wisdom.remaining_today();
        prop_assert!(remaining >= 0);
        prop_assert!(remaining <= DAILY_TARGET);
        if is_active && exposures < DAILY_TARGET {
            prop_assert_eq!(remaining, DAILY_TARGET - exposures);
        }
    }
}

use chrono::{NaiveDate, NaiveTime};
use planwise_core::{
    day_plan, separate_scheduled, tasks_for_date, RecurrenceRule, TaskRecord,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn texts(tasks: &[&TaskRecord]) -> Vec<String> {
    tasks.iter().map(|task| task.text.clone()).collect()
}

#[test]
fn membership_is_union_of_all_three_date_fields() {
    let day = date(2024, 3, 4);
    let mut by_schedule = TaskRecord::new("scheduled");
    by_schedule.scheduled_date = Some(day);
    let mut by_plan = TaskRecord::new("planned");
    by_plan.planned_day = Some(day);
    let mut by_block = TaskRecord::new("blocked");
    by_block.time_block_start = day.and_hms_opt(13, 0, 0);
    let mut elsewhere = TaskRecord::new("other day");
    elsewhere.scheduled_date = Some(date(2024, 3, 5));
    let undated = TaskRecord::new("undated");

    let tasks = vec![by_schedule, elsewhere, by_plan, undated, by_block];
    assert_eq!(
        texts(&tasks_for_date(&tasks, day)),
        vec!["scheduled", "planned", "blocked"]
    );
}

#[test]
fn conflicting_fields_make_a_task_member_of_each_day() {
    let mut task = TaskRecord::new("split");
    task.scheduled_date = Some(date(2024, 3, 4));
    task.planned_day = Some(date(2024, 3, 6));
    task.time_block_start = date(2024, 3, 8).and_hms_opt(9, 0, 0);
    let tasks = vec![task];

    for day in [date(2024, 3, 4), date(2024, 3, 6), date(2024, 3, 8)] {
        assert_eq!(tasks_for_date(&tasks, day).len(), 1, "missing on {day}");
    }
    assert!(tasks_for_date(&tasks, date(2024, 3, 5)).is_empty());
}

#[test]
fn templates_never_belong_to_a_day() {
    let day = date(2024, 3, 4);
    let mut template = TaskRecord::recurring_template("standup", day, RecurrenceRule::daily());
    template.planned_day = Some(day);
    template.time_block_start = day.and_hms_opt(9, 0, 0);

    assert!(tasks_for_date(&[template], day).is_empty());
}

#[test]
fn separate_scheduled_is_an_exact_partition() {
    let day = date(2024, 3, 4);
    let mut block = TaskRecord::new("block");
    block.time_block_start = day.and_hms_opt(10, 0, 0);
    let mut legacy = TaskRecord::new("legacy time");
    legacy.scheduled_date = Some(day);
    legacy.scheduled_time = NaiveTime::from_hms_opt(7, 45, 0);
    let mut pooled = TaskRecord::new("pooled");
    pooled.planned_day = Some(day);
    let tasks = vec![pooled, block, legacy];

    let members = tasks_for_date(&tasks, day);
    let split = separate_scheduled(members.iter().copied());
    assert_eq!(texts(&split.scheduled), vec!["block", "legacy time"]);
    assert_eq!(texts(&split.unscheduled), vec!["pooled"]);
    assert_eq!(split.scheduled.len() + split.unscheduled.len(), members.len());
}

#[test]
fn day_plan_orders_by_placement_and_carries_overdue_into_today() {
    let today = date(2024, 3, 4);
    let mut afternoon = TaskRecord::new("afternoon");
    afternoon.time_block_start = today.and_hms_opt(15, 0, 0);
    let mut morning = TaskRecord::new("morning");
    morning.scheduled_date = Some(today);
    morning.scheduled_time = NaiveTime::from_hms_opt(8, 0, 0);
    let mut yesterday = TaskRecord::new("yesterday");
    yesterday.scheduled_date = Some(date(2024, 3, 3));
    let tasks = vec![afternoon, yesterday, morning];

    let plan = day_plan(&tasks, today, today);
    assert_eq!(texts(&plan.scheduled), vec!["morning", "afternoon"]);
    assert_eq!(texts(&plan.carried_over), vec!["yesterday"]);

    let tomorrow = day_plan(&tasks, date(2024, 3, 5), today);
    assert!(tomorrow.is_empty());
}

#[test]
fn empty_input_resolves_to_nothing() {
    let day = date(2024, 3, 4);
    assert!(tasks_for_date(&[], day).is_empty());
    let split = separate_scheduled(Vec::<&TaskRecord>::new());
    assert!(split.scheduled.is_empty());
    assert!(split.unscheduled.is_empty());
}

mod common;

use anyhow::Result;
use chrono::{Duration, NaiveDate, TimeZone, Utc, Weekday};
use common::{add_session, local, profile, store_with_user, RecordingView, USER_ID};
use fit_home_lib::db;
use fit_home_lib::goals::{GoalEntry, STEP_TARGET_ID};
use fit_home_lib::{
    AddSessionParams, AppService, Config, DbError, HomePresenter, NoIdentity, ProfileImage,
    ProfileUpdate, SessionStatus, StaticIdentity, Store, UserProfile,
};

fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

fn presenter(store: &Store) -> HomePresenter<NoIdentity> {
    HomePresenter::new(store.clone(), NoIdentity, 10_000)
}

// Helper function to create a test service with in-memory database
fn create_test_service() -> Result<AppService> {
    Ok(AppService {
        config: Config::default(),
        store: Store::open_in_memory()?,
        db_path: ":memory:".into(),
        config_path: "test_config.toml".into(),
    })
}

// ---- Storage ----

#[test]
fn test_current_user_follows_sign_in() -> Result<()> {
    let store = Store::open_in_memory()?;
    assert!(store.current_user()?.is_none());

    store.save_user(&UserProfile::new("a", "Ann"))?;
    store.save_user(&UserProfile::new("b", "Ben"))?;
    store.sign_in("a")?;
    assert_eq!(store.current_user()?.unwrap().user_id, "a");
    store.sign_in("b")?;
    assert_eq!(store.current_user()?.unwrap().user_id, "b");

    let err = store.sign_in("nobody").unwrap_err();
    assert!(matches!(err, DbError::UserNotFound(_)));
    // The failed sign-in did not sign anyone out.
    assert_eq!(store.current_user()?.unwrap().user_id, "b");
    Ok(())
}

#[test]
fn test_sessions_in_range_is_inclusive() -> Result<()> {
    let store = store_with_user(profile(None, None))?;
    let start = local(2026, 10, 14, 0, 0);
    let end = local(2026, 10, 14, 15, 0);
    add_session(&store, start, SessionStatus::Completed, 1, 0)?;
    add_session(&store, end, SessionStatus::Completed, 2, 0)?;
    add_session(&store, start - Duration::milliseconds(1), SessionStatus::Completed, 4, 0)?;
    add_session(&store, end + Duration::milliseconds(1), SessionStatus::Completed, 8, 0)?;

    let sessions = store.sessions_in_range(USER_ID, &start, &end)?;
    let steps: Vec<i64> = sessions.iter().map(|s| s.steps).collect();
    assert_eq!(steps, vec![1, 2]);
    Ok(())
}

#[test]
fn test_sessions_are_scoped_to_user() -> Result<()> {
    let store = store_with_user(profile(None, None))?;
    store.save_user(&UserProfile::new("other", "Other"))?;
    let at = local(2026, 10, 14, 9, 0);
    add_session(&store, at, SessionStatus::Completed, 100, 0)?;
    store.add_session(&fit_home_lib::NewSession {
        user_id: "other",
        workout_name: "Run",
        start_time: at.with_timezone(&Utc),
        duration_seconds: 60,
        status: SessionStatus::Completed,
        steps: 5_000,
        calories_burned: 0,
        distance_km: 0.0,
    })?;

    let sessions = store.sessions_in_range(USER_ID, &(at - Duration::hours(1)), &at)?;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].steps, 100);
    assert_eq!(sessions[0].status, SessionStatus::Completed);
    Ok(())
}

#[test]
fn test_goal_update_round_trip() -> Result<()> {
    let store = store_with_user(profile(None, None))?;
    let id = store.add_goal(USER_ID, wednesday(), "Stretch", "10 minutes")?;

    let mut goal = store.goal(id)?.unwrap();
    assert_eq!(goal.date, "2026-10-14");
    assert!(!goal.is_completed);
    assert_eq!(goal.completed_at, None);

    let now = Utc.with_ymd_and_hms(2026, 10, 14, 12, 30, 0).unwrap();
    goal.set_completed(true, now);
    store.update_goal(&goal)?;
    let reloaded = store.goal(id)?.unwrap();
    assert!(reloaded.is_completed);
    assert_eq!(reloaded.completed_at, Some(now));

    goal.goal_id = 999;
    assert!(matches!(store.update_goal(&goal), Err(DbError::GoalNotFound(999))));
    Ok(())
}

#[test]
fn test_writes_notify_subscribers() -> Result<()> {
    use fit_home_lib::feed::Change;

    let store = store_with_user(profile(None, None))?;
    let subscription = store.subscribe();
    assert_eq!(store.feed().listener_count(), 1);

    add_session(&store, local(2026, 10, 14, 9, 0), SessionStatus::Completed, 1, 0)?;
    store.add_goal(USER_ID, wednesday(), "Walk the dog", "")?;
    assert_eq!(subscription.drain(), vec![Change::Sessions, Change::Goals]);

    drop(subscription);
    assert_eq!(store.feed().listener_count(), 0);
    Ok(())
}

// ---- Presenter ----

#[test]
fn test_snapshot_without_user_is_none() -> Result<()> {
    let store = Store::open_in_memory()?;
    let presenter = presenter(&store);
    assert!(presenter.snapshot(&local(2026, 10, 14, 15, 0))?.is_none());

    let mut view = RecordingView::default();
    assert!(!presenter.render(&mut view, &local(2026, 10, 14, 15, 0)));
    assert_eq!(view.renders, 0);
    Ok(())
}

#[test]
fn test_today_activity_and_rings() -> Result<()> {
    let store = store_with_user(profile(Some(10_000), Some(500)))?;
    let now = local(2026, 10, 14, 15, 0);
    add_session(&store, local(2026, 10, 14, 8, 0), SessionStatus::Completed, 6_500, 320)?;
    add_session(&store, local(2026, 10, 14, 12, 0), SessionStatus::Completed, 5_000, 250)?;
    add_session(&store, local(2026, 10, 14, 13, 0), SessionStatus::InProgress, 9_999, 999)?;
    // Yesterday and later today are outside the window.
    add_session(&store, local(2026, 10, 13, 20, 0), SessionStatus::Completed, 3_000, 100)?;
    add_session(&store, local(2026, 10, 14, 18, 0), SessionStatus::Completed, 3_000, 100)?;

    let snapshot = presenter(&store).snapshot(&now)?.unwrap();
    assert_eq!(snapshot.today.steps_text, "11,500");
    assert_eq!(snapshot.today.calories_text, "570");
    assert_eq!(snapshot.today.active_minutes_text, "20");
    assert_eq!(snapshot.today.distance_text, "2.0 km");

    let steps_ring = snapshot.rings.steps.unwrap();
    assert_eq!(steps_ring.value_text, "11,500");
    assert_eq!(steps_ring.goal_text, "/10,000");
    assert_eq!(steps_ring.fraction, 1.0);
    assert_eq!(snapshot.rings.calories.unwrap().goal_text, "/500");
    Ok(())
}

#[test]
fn test_rings_only_for_set_goals() -> Result<()> {
    let store = store_with_user(profile(None, Some(500)))?;
    let snapshot = presenter(&store).snapshot(&local(2026, 10, 14, 15, 0))?.unwrap();
    assert!(snapshot.rings.steps.is_none());
    assert!(snapshot.rings.calories.is_some());
    Ok(())
}

#[test]
fn test_weekly_target_texts() -> Result<()> {
    let store = store_with_user(profile(Some(5_000), None))?;
    // Monday and Wednesday count, last Sunday does not.
    add_session(&store, local(2026, 10, 12, 9, 0), SessionStatus::Completed, 10_000, 0)?;
    add_session(&store, local(2026, 10, 14, 9, 0), SessionStatus::Completed, 7_500, 0)?;
    add_session(&store, local(2026, 10, 11, 9, 0), SessionStatus::Completed, 40_000, 0)?;

    let snapshot = presenter(&store).snapshot(&local(2026, 10, 14, 15, 0))?.unwrap();
    assert_eq!(snapshot.weekly_target.summary_text, "17,500 of 35,000 steps");
    assert_eq!(snapshot.weekly_target.percent_text, "50%");
    assert_eq!(snapshot.weekly_target.progress.percent, 50);
    Ok(())
}

#[test]
fn test_weekly_target_zero_default_goal() -> Result<()> {
    let store = store_with_user(profile(None, None))?;
    add_session(&store, local(2026, 10, 14, 9, 0), SessionStatus::Completed, 7_500, 0)?;
    let presenter = HomePresenter::new(store.clone(), NoIdentity, 0);
    let snapshot = presenter.snapshot(&local(2026, 10, 14, 15, 0))?.unwrap();
    assert_eq!(snapshot.weekly_target.percent_text, "0%");
    assert_eq!(snapshot.weekly_target.summary_text, "7,500 of 0 steps");
    Ok(())
}

#[test]
fn test_weekly_target_with_huge_step_goal() -> Result<()> {
    let store = store_with_user(profile(Some(i64::MAX), None))?;
    add_session(&store, local(2026, 10, 14, 9, 0), SessionStatus::Completed, 7_500, 0)?;

    let snapshot = presenter(&store).snapshot(&local(2026, 10, 14, 15, 0))?.unwrap();
    assert_eq!(
        snapshot.weekly_target.summary_text,
        "7,500 of 9,223,372,036,854,775,807 steps"
    );
    assert_eq!(snapshot.weekly_target.percent_text, "0%");
    Ok(())
}

#[test]
fn test_weekly_checkmarks() -> Result<()> {
    let store = store_with_user(profile(Some(5_000), None))?;
    // Monday: steps met. Tuesday: steps met but a goal is open. Wednesday: short.
    add_session(&store, local(2026, 10, 12, 9, 0), SessionStatus::Completed, 5_000, 0)?;
    add_session(&store, local(2026, 10, 13, 9, 0), SessionStatus::Completed, 6_000, 0)?;
    add_session(&store, local(2026, 10, 14, 9, 0), SessionStatus::Completed, 4_999, 0)?;
    let tuesday = NaiveDate::from_ymd_opt(2026, 10, 13).unwrap();
    store.add_goal(USER_ID, tuesday, "Meal prep", "")?;

    let snapshot = presenter(&store).snapshot(&local(2026, 10, 14, 15, 0))?.unwrap();
    let marks = &snapshot.checkmarks;
    assert_eq!(marks.days[0].weekday, Weekday::Mon);
    assert_eq!(marks.days[6].weekday, Weekday::Sun);
    assert!(marks.get(Weekday::Mon).complete);
    assert_eq!(marks.get(Weekday::Mon).symbol(), "✓");
    assert!(!marks.get(Weekday::Tue).complete);
    assert!(!marks.get(Weekday::Wed).complete);
    assert_eq!(marks.get(Weekday::Wed).symbol(), "○");
    assert!(!marks.get(Weekday::Sun).complete);
    Ok(())
}

#[test]
fn test_checkmarks_need_goals() -> Result<()> {
    let store = store_with_user(profile(None, None))?;
    add_session(&store, local(2026, 10, 12, 9, 0), SessionStatus::Completed, 50_000, 2_000)?;
    let snapshot = presenter(&store).snapshot(&local(2026, 10, 14, 15, 0))?.unwrap();
    assert!(snapshot.checkmarks.days.iter().all(|day| !day.complete));
    Ok(())
}

#[test]
fn test_goal_list_for_today() -> Result<()> {
    let store = store_with_user(profile(Some(10_000), None))?;
    add_session(&store, local(2026, 10, 14, 9, 0), SessionStatus::Completed, 10_000, 0)?;
    let stretch = store.add_goal(USER_ID, wednesday(), "Stretch", "10 minutes")?;
    store.add_goal(USER_ID, wednesday() + Duration::days(1), "Tomorrow", "")?;

    let snapshot = presenter(&store).snapshot(&local(2026, 10, 14, 15, 0))?.unwrap();
    let goals = &snapshot.goals;
    assert_eq!(goals.date, wednesday());
    assert_eq!(goals.entries.len(), 2);
    assert_eq!(goals.entries[0].display_id(), STEP_TARGET_ID);
    assert!(goals.entries[0].is_completed());
    assert_eq!(goals.entries[0].description(), "10,000 / 10,000");
    match &goals.entries[1] {
        GoalEntry::Stored(goal) => assert_eq!(goal.goal_id, stretch),
        other => panic!("expected stored goal, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_goal_list_empty_state() -> Result<()> {
    let store = store_with_user(profile(None, None))?;
    let snapshot = presenter(&store).snapshot(&local(2026, 10, 14, 15, 0))?.unwrap();
    assert!(snapshot.goals.is_empty());
    Ok(())
}

#[test]
fn test_weekly_chart() -> Result<()> {
    let store = store_with_user(profile(None, None))?;
    add_session(&store, local(2026, 10, 12, 9, 0), SessionStatus::Completed, 1_200, 0)?;
    add_session(&store, local(2026, 10, 14, 9, 0), SessionStatus::Completed, 3_400, 0)?;
    add_session(&store, local(2026, 10, 14, 10, 0), SessionStatus::Cancelled, 9_000, 0)?;

    let snapshot = presenter(&store).snapshot(&local(2026, 10, 14, 15, 0))?.unwrap();
    let labels: Vec<&str> = snapshot.chart.bars.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]);
    let steps: Vec<i64> = snapshot.chart.bars.iter().map(|b| b.steps).collect();
    assert_eq!(steps, vec![0, 1_200, 0, 3_400, 0, 0, 0]);
    Ok(())
}

#[test]
fn test_header_and_profile_image() -> Result<()> {
    let mut user = profile(None, None);
    user.age = 0;
    let store = store_with_user(user.clone())?;
    let now = local(2026, 10, 14, 15, 0);

    let snapshot = presenter(&store).snapshot(&now)?.unwrap();
    assert_eq!(snapshot.header.greeting, "Alex");
    assert!(snapshot.header.show_badge);
    assert_eq!(snapshot.header.image, ProfileImage::DefaultIcon);

    let fallback = "https://example.com/account.png".to_string();
    let with_identity =
        HomePresenter::new(store.clone(), StaticIdentity::new(Some(fallback.clone())), 10_000);
    assert_eq!(
        with_identity.snapshot(&now)?.unwrap().header.image,
        ProfileImage::Url(fallback.clone())
    );

    // A stored URL wins over the account picture; a blank one does not.
    user.profile_image_url = Some("https://example.com/me.png".to_string());
    user.age = 31;
    store.save_user(&user)?;
    let snapshot = with_identity.snapshot(&now)?.unwrap();
    assert_eq!(
        snapshot.header.image,
        ProfileImage::Url("https://example.com/me.png".to_string())
    );
    assert!(!snapshot.header.show_badge);

    user.profile_image_url = Some("   ".to_string());
    store.save_user(&user)?;
    assert_eq!(
        with_identity.snapshot(&now)?.unwrap().header.image,
        ProfileImage::Url(fallback)
    );
    Ok(())
}

#[test]
fn test_toggle_goal_sets_and_clears_timestamp() -> Result<()> {
    let store = store_with_user(profile(None, None))?;
    let id = store.add_goal(USER_ID, wednesday(), "Stretch", "")?;
    let presenter = presenter(&store);
    let now = Utc.with_ymd_and_hms(2026, 10, 14, 13, 0, 0).unwrap();

    let goal = presenter.toggle_goal(id, true, now)?;
    assert!(goal.is_completed);
    assert_eq!(store.goal(id)?.unwrap().completed_at, Some(now));

    presenter.toggle_goal(id, false, now)?;
    let goal = store.goal(id)?.unwrap();
    assert!(!goal.is_completed);
    assert_eq!(goal.completed_at, None);
    Ok(())
}

#[test]
fn test_target_goals_cannot_be_toggled() -> Result<()> {
    let store = store_with_user(profile(Some(10_000), None))?;
    let presenter = presenter(&store);
    let now = Utc::now();

    assert!(presenter.toggle_goal(STEP_TARGET_ID, true, now).is_err());
    let snapshot = presenter.snapshot(&local(2026, 10, 14, 15, 0))?.unwrap();
    assert!(presenter.toggle_entry(&snapshot.goals.entries[0], true, now).is_err());
    assert!(presenter.toggle_goal(42, true, now).is_err());
    Ok(())
}

#[test]
fn test_failed_refresh_keeps_previous_view() -> Result<()> {
    let conn = rusqlite::Connection::open_in_memory()?;
    db::init_db(&conn)?;
    db::save_user(&conn, &profile(Some(10_000), None))?;
    let store = Store::new(conn);
    store.sign_in(USER_ID)?;
    let presenter = presenter(&store);
    let now = local(2026, 10, 14, 15, 0);

    let mut view = RecordingView::default();
    assert!(presenter.render(&mut view, &now));
    assert_eq!(view.renders, 1);
    let before = view.today.clone();

    // Break the sessions table: the next pass fails and must not touch the view.
    let broken = rusqlite::Connection::open_in_memory()?;
    db::init_db(&broken)?;
    broken.execute("DROP TABLE workout_sessions", [])?;
    db::save_user(&broken, &profile(Some(10_000), None))?;
    let broken_store = Store::new(broken);
    broken_store.sign_in(USER_ID)?;
    let broken_presenter = HomePresenter::new(broken_store, NoIdentity, 10_000);

    assert!(broken_presenter.snapshot(&now).is_err());
    assert!(!broken_presenter.render(&mut view, &now));
    assert_eq!(view.renders, 1);
    assert_eq!(view.today, before);
    Ok(())
}

// ---- Service ----

#[test]
fn test_service_profile_and_data() -> Result<()> {
    let service = create_test_service()?;
    assert!(service.current_user().is_err());
    assert!(service.update_profile(ProfileUpdate::default()).is_err());

    let user = service.update_profile(ProfileUpdate {
        user_id: Some("me".to_string()),
        display_name: Some("Robin".to_string()),
        daily_step_goal: Some(Some(8_000)),
        ..Default::default()
    })?;
    assert_eq!(user.display_name, "Robin");
    assert_eq!(service.current_user()?.daily_step_goal, Some(8_000));

    // Edits apply to the signed-in profile; Some(None) clears a goal.
    service.update_profile(ProfileUpdate {
        daily_step_goal: Some(None),
        daily_calorie_goal: Some(Some(600)),
        age: Some(40),
        ..Default::default()
    })?;
    let user = service.current_user()?;
    assert_eq!(user.daily_step_goal, None);
    assert_eq!(user.daily_calorie_goal, Some(600));
    assert_eq!(user.age, 40);
    assert_eq!(user.display_name, "Robin");

    let session_id = service.add_session(AddSessionParams {
        workout_name: "Evening Run".to_string(),
        start_time: Utc::now(),
        duration_seconds: 1_800,
        status: SessionStatus::Completed,
        steps: 4_000,
        calories_burned: 300,
        distance_km: 3.2,
    })?;
    assert!(session_id > 0);

    let today = Utc::now().date_naive();
    assert!(service.add_goal(today, "   ", "").is_err());
    let goal_id = service.add_goal(today, "Drink water", "2 litres")?;
    let goals = service.list_goals(today)?;
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].title, "Drink water");

    let toggled = service.toggle_goal(goal_id, true)?;
    assert!(toggled.is_completed);
    assert!(toggled.completed_at.is_some());
    Ok(())
}

#[test]
fn test_config_load_creates_defaults() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("fit-home-test-{}", std::process::id()));
    let path = dir.join("config.toml");
    let _ = std::fs::remove_dir_all(&dir);

    let config = fit_home_lib::load_config_util(&path)?;
    assert_eq!(config, Config::default());
    assert!(path.exists());

    let mut changed = config.clone();
    changed.set_default_daily_step_goal(0)?;
    changed.fallback_profile_image = Some("https://example.com/a.png".to_string());
    fit_home_lib::save_config_util(&path, &changed)?;
    assert_eq!(fit_home_lib::load_config_util(&path)?, changed);
    assert!(changed.clone().set_default_daily_step_goal(-1).is_err());

    // Missing fields fall back to defaults.
    std::fs::write(&path, "log_filter = \"debug\"\n")?;
    let partial = fit_home_lib::load_config_util(&path)?;
    assert_eq!(partial.log_filter, "debug");
    assert_eq!(partial.default_daily_step_goal, 10_000);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_config_load_rejects_negative_step_goal() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("fit-home-neg-goal-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("config.toml");
    std::fs::write(&path, "default_daily_step_goal = -5000\n")?;

    let result = fit_home_lib::load_config_util(&path);
    assert!(matches!(
        result,
        Err(fit_home_lib::ConfigError::InvalidStepGoal(-5000))
    ));

    std::fs::write(&path, "default_daily_step_goal = 0\n")?;
    assert_eq!(fit_home_lib::load_config_util(&path)?.default_daily_step_goal, 0);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_parse_color() {
    assert!(fit_home_lib::parse_color("darkblue").is_ok());
    assert!(fit_home_lib::parse_color("Green").is_ok());
    assert!(fit_home_lib::parse_color("chartreuse").is_err());
}

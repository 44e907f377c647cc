// Playback controller and player tests, driven with explicit instants

use std::time::{Duration, Instant};

use stepviz::interpreter::{Engine, EngineConfig};
use stepviz::playback::{PlaybackController, PlaybackState, Player};

fn player(source: &str) -> Player {
    let mut engine = Engine::new(EngineConfig::default());
    engine.start_run(source).unwrap();
    Player::new(engine, PlaybackController::new(Duration::from_secs(1), 1.0))
}

#[test]
fn test_timer_paces_steps() {
    let t0 = Instant::now();
    let mut player = player("a = 1\nb = 2\nc = 3");

    // Idle never steps on its own
    assert!(player.tick(t0).unwrap().is_none());

    player.play(t0);
    assert!(player.tick(t0).unwrap().is_some());
    assert_eq!(player.engine().cursor(), 1);

    // Not due yet
    assert!(player.tick(t0 + Duration::from_millis(500)).unwrap().is_none());
    assert_eq!(player.engine().cursor(), 1);

    assert!(player.tick(t0 + Duration::from_secs(1)).unwrap().is_some());
    assert!(player.tick(t0 + Duration::from_secs(2)).unwrap().is_some());
    assert_eq!(player.state(), PlaybackState::Completed);

    assert!(player.tick(t0 + Duration::from_secs(10)).unwrap().is_none());
}

#[test]
fn test_set_speed_while_paused_never_steps() {
    let t0 = Instant::now();
    let mut player = player("a = 1\nb = 2");
    player.play(t0);
    player.tick(t0).unwrap();
    player.pause();

    player.controller_mut().set_speed(3.0).unwrap();
    assert_eq!(player.state(), PlaybackState::Paused);
    for secs in 0..5 {
        assert!(player.tick(t0 + Duration::from_secs(secs)).unwrap().is_none());
    }
    assert_eq!(player.engine().cursor(), 1);

    // The new speed applies once playback resumes
    let t1 = t0 + Duration::from_secs(5);
    player.play(t1);
    assert_eq!(player.controller().interval(), Duration::from_secs(1).div_f64(3.0));
    assert!(player.tick(t1).unwrap().is_some());
    assert_eq!(player.state(), PlaybackState::Completed);
}

#[test]
fn test_speed_change_while_running_reschedules() {
    let t0 = Instant::now();
    let mut player = player("a = 1\nb = 2\nc = 3");
    player.play(t0);
    player.tick(t0).unwrap();
    assert_eq!(player.controller().next_due(), Some(t0 + Duration::from_secs(1)));

    player.controller_mut().set_speed(2.0).unwrap();
    assert_eq!(
        player.controller().next_due(),
        Some(t0 + Duration::from_millis(500))
    );
    assert_eq!(player.engine().cursor(), 1);
}

#[test]
fn test_failure_halts_playback() {
    let t0 = Instant::now();
    let mut player = player("a = 1\nb = missing\nc = 3");
    player.play(t0);
    player.tick(t0).unwrap();

    let result = player
        .tick(t0 + Duration::from_secs(1))
        .unwrap()
        .cloned()
        .unwrap();
    assert!(result.error.is_some());
    assert_eq!(player.state(), PlaybackState::Failed);

    // Neither the timer nor the step button moves past a failure
    assert!(player.tick(t0 + Duration::from_secs(5)).unwrap().is_none());
    assert!(player.step_once(t0 + Duration::from_secs(5)).unwrap().is_none());
    assert_eq!(player.engine().cursor(), 1);
    assert!(player.engine().environment().get("a").is_some());

    // play is refused until reset
    player.play(t0 + Duration::from_secs(6));
    assert_eq!(player.state(), PlaybackState::Failed);

    player.reset();
    assert_eq!(player.state(), PlaybackState::Idle);
    assert_eq!(player.engine().cursor(), 0);
    assert!(player.engine().environment().is_empty());
    assert!(player.last_result().is_none());
}

#[test]
fn test_manual_steps_from_idle() {
    let t0 = Instant::now();
    let mut player = player("for i in range(2):\n    print(i)\ndone = True");

    let first = player.step_once(t0).unwrap().cloned().unwrap();
    assert_eq!(first.output, "0\n1\n");
    assert_eq!(player.state(), PlaybackState::Idle);

    player.step_once(t0).unwrap();
    assert_eq!(player.state(), PlaybackState::Completed);
    assert!(player.step_once(t0).unwrap().is_none());
}

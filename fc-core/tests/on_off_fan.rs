//! On/off controller driven through its public API on a paused clock

mod common;

use std::time::Duration;

use common::{FakePin, FakeRegistry, FakeSensor};
use fc_core::{FanController, FanError, FanSettings, FanStatus, OnOffFan, OnOffFanSettings, OnOffStatus};
use tokio::time::sleep;

fn settings(on: f64, off: f64, delay_secs: u64) -> OnOffFanSettings {
    OnOffFanSettings {
        board_name: "pi".into(),
        fan_pin: "18".into(),
        sensor_name: "cpu".into(),
        sensor_value_key: "temp".into(),
        sensor_value_regex: None,
        on_temperature: Some(on),
        off_temperature: Some(off),
        on_delay: delay_secs,
        off_delay: delay_secs,
    }
}

#[tokio::test(start_paused = true)]
async fn test_off_delay_holds_fan_on() {
    let sensor = FakeSensor::new(35.0);
    let pin = FakePin::new();
    let registry = FakeRegistry::new()
        .with_sensor("cpu", sensor.clone())
        .with_pin("pi", "18", pin.clone());

    let fan = OnOffFan::new("case", &settings(30.0, 30.0, 1), &registry)
        .await
        .unwrap();

    // first switch is never delayed
    sleep(Duration::from_millis(50)).await;
    assert!(pin.is_high());

    sleep(Duration::from_millis(500)).await;
    sensor.set(25.0);

    // t = 950ms, still inside the off delay
    sleep(Duration::from_millis(400)).await;
    assert!(pin.is_high());

    // t = 1050ms, the tick at 1s switched it off
    sleep(Duration::from_millis(100)).await;
    assert!(!pin.is_high());
    assert_eq!(pin.writes(), vec![true, false]);

    fan.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_zero_delay_follows_temperature() {
    let sensor = FakeSensor::new("20");
    let pin = FakePin::new();
    let registry = FakeRegistry::new()
        .with_sensor("cpu", sensor.clone())
        .with_pin("pi", "18", pin.clone());

    let fan = OnOffFan::new("case", &settings(60.0, 50.0, 0), &registry)
        .await
        .unwrap();

    sleep(Duration::from_millis(250)).await;
    assert!(pin.writes().is_empty());

    sensor.set("61.5");
    sleep(Duration::from_millis(100)).await;
    assert!(pin.is_high());

    // inside the band nothing changes
    sensor.set("55");
    sleep(Duration::from_millis(300)).await;
    assert!(pin.is_high());

    sensor.set("49.9");
    sleep(Duration::from_millis(100)).await;
    assert!(!pin.is_high());
    assert_eq!(pin.writes(), vec![true, false]);

    fan.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_pin_state_is_read_back_every_tick() {
    let sensor = FakeSensor::new(20.0);
    let pin = FakePin::new();
    let registry = FakeRegistry::new()
        .with_sensor("cpu", sensor.clone())
        .with_pin("pi", "18", pin.clone());

    let fan = OnOffFan::new("case", &settings(60.0, 50.0, 0), &registry)
        .await
        .unwrap();
    sleep(Duration::from_millis(50)).await;

    // someone else switched the fan on while it is cold
    pin.force(true);
    sleep(Duration::from_millis(100)).await;
    assert!(!pin.is_high());
    assert_eq!(pin.writes(), vec![false]);

    fan.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_sensor_failures_leave_pin_alone() {
    let sensor = FakeSensor::new(20.0);
    sensor.unplug();
    let pin = FakePin::new();
    let registry = FakeRegistry::new()
        .with_sensor("cpu", sensor.clone())
        .with_pin("pi", "18", pin.clone());

    let fan = OnOffFan::new("case", &settings(10.0, 5.0, 0), &registry)
        .await
        .unwrap();
    sleep(Duration::from_millis(450)).await;

    assert!(pin.writes().is_empty());
    assert!(sensor.reads() >= 4);
    assert!(matches!(fan.status().await, Err(FanError::Source(_))));

    // recovers once the sensor is back
    sensor.set(20.0);
    sleep(Duration::from_millis(100)).await;
    assert!(pin.is_high());

    fan.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_does_not_spawn_a_second_loop() {
    let sensor = FakeSensor::new(20.0);
    let pin = FakePin::new();
    let registry = FakeRegistry::new()
        .with_sensor("cpu", sensor.clone())
        .with_pin("pi", "18", pin.clone());

    let fan = OnOffFan::new("case", &settings(60.0, 50.0, 0), &registry)
        .await
        .unwrap();
    for _ in 0..3 {
        fan.reconfigure(&settings(65.0, 55.0, 0), &registry)
            .await
            .unwrap();
    }

    sleep(Duration::from_millis(50)).await;
    let before = sensor.reads();
    // ticks at 100ms through 1000ms
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(sensor.reads() - before, 10);

    fan.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_switches_sensor() {
    let cold = FakeSensor::new(20.0);
    let hot = FakeSensor::new(80.0);
    let pin = FakePin::new();
    let registry = FakeRegistry::new()
        .with_sensor("cpu", cold.clone())
        .with_sensor("gpu", hot.clone())
        .with_pin("pi", "18", pin.clone());

    let fan = OnOffFan::new("case", &settings(60.0, 50.0, 0), &registry)
        .await
        .unwrap();
    sleep(Duration::from_millis(150)).await;
    assert!(!pin.is_high());

    let mut gpu = settings(60.0, 50.0, 0);
    gpu.sensor_name = "gpu".into();
    fan.reconfigure(&gpu, &registry).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    assert!(pin.is_high());

    // unknown sensor keeps the old wiring
    let mut missing = settings(60.0, 50.0, 0);
    missing.sensor_name = "nvme".into();
    assert!(matches!(
        fan.reconfigure(&missing, &registry).await,
        Err(FanError::DeviceNotFound(_))
    ));
    assert_eq!(fan.status().await.unwrap().temperature, 80.0);

    fan.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_is_final() {
    let sensor = FakeSensor::new(20.0);
    let pin = FakePin::new();
    let registry = FakeRegistry::new()
        .with_sensor("cpu", sensor.clone())
        .with_pin("pi", "18", pin.clone());

    let fan = OnOffFan::new("case", &settings(60.0, 50.0, 0), &registry)
        .await
        .unwrap();
    fan.shutdown().await.unwrap();
    assert!(!fan.is_running());
    assert!(matches!(fan.shutdown().await, Err(FanError::NotRunning)));

    assert!(matches!(
        fan.reconfigure(&settings(10.0, 5.0, 0), &registry).await,
        Err(FanError::NotRunning)
    ));
    assert!(!fan.is_running());

    let reads = sensor.reads();
    sleep(Duration::from_millis(500)).await;
    assert_eq!(sensor.reads(), reads);
    assert!(pin.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_racing_shutdown_never_revives_loop() {
    let sensor = FakeSensor::new(80.0);
    let pin = FakePin::new();
    let registry = FakeRegistry::new()
        .with_sensor("cpu", sensor.clone())
        .with_pin("pi", "18", pin.clone());

    let fan = OnOffFan::new("case", &settings(60.0, 50.0, 0), &registry)
        .await
        .unwrap();
    sleep(Duration::from_millis(50)).await;

    let new_settings = settings(60.0, 50.0, 0);
    let (stopped, reconfigured) = tokio::join!(
        fan.shutdown(),
        fan.reconfigure(&new_settings, &registry)
    );
    stopped.unwrap();
    // whichever ran first, the loop must stay down
    assert!(matches!(reconfigured, Ok(()) | Err(FanError::NotRunning)));

    let reads = sensor.reads();
    let writes = pin.writes();
    sleep(Duration::from_millis(500)).await;

    assert!(!fan.is_running());
    assert_eq!(sensor.reads(), reads);
    assert_eq!(pin.writes(), writes);
}

#[tokio::test(start_paused = true)]
async fn test_failed_pin_write_is_retried_without_dwell() {
    let sensor = FakeSensor::new(35.0);
    let pin = FakePin::new();
    pin.fail_writes(true);
    let registry = FakeRegistry::new()
        .with_sensor("cpu", sensor.clone())
        .with_pin("pi", "18", pin.clone());

    let fan = OnOffFan::new("case", &settings(30.0, 30.0, 1), &registry)
        .await
        .unwrap();

    // ticks at 0, 100 and 200 all fail to switch
    sleep(Duration::from_millis(250)).await;
    assert_eq!(pin.failed_writes(), 3);
    assert!(!pin.is_high());
    assert_eq!(fan.last_state_change(), None);
    assert!(fan.is_running());

    // the next tick switches on straight away, no one second dwell
    pin.fail_writes(false);
    sleep(Duration::from_millis(100)).await;
    assert!(pin.is_high());
    assert_eq!(pin.writes(), vec![true]);
    assert!(fan.last_state_change().is_some());

    fan.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_controller_enum_dispatch() {
    let sensor = FakeSensor::new("41.0");
    let pin = FakePin::new();
    let registry = FakeRegistry::new()
        .with_sensor("cpu", sensor)
        .with_pin("pi", "18", pin);

    let settings = FanSettings::OnOff(settings(60.0, 50.0, 0));
    let fan = FanController::new("case", &settings, &registry)
        .await
        .unwrap();
    assert_eq!(fan.kind(), "on_off");
    assert_eq!(fan.name(), "case");

    let status = fan.status().await.unwrap();
    assert_eq!(
        status,
        FanStatus::OnOff(OnOffStatus {
            temperature: 41.0,
            fan_is_running: false
        })
    );
    assert_eq!(
        serde_json::to_value(status).unwrap(),
        serde_json::json!({ "temperature": 41.0, "fan_is_running": false })
    );

    let pwm = FanSettings::Pwm(Default::default());
    assert!(matches!(
        fan.reconfigure(&pwm, &registry).await,
        Err(FanError::Config(_))
    ));

    fan.shutdown().await.unwrap();
}

//! Session lifecycle against the mock driver: idempotence, fatal teardown,
//! reload and unloading from inside a subscriber.

use interceptor::{
    Config, DeviceId, Error, Input, Key, KeyEvent, KeyState, KeyStroke, KeyboardFilter,
    MockDriver, MouseFilter, Stroke,
};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(2);

fn setup() -> (Arc<MockDriver>, Input<MockDriver>) {
    let driver = Arc::new(MockDriver::new());
    let config = Config {
        poll_interval: Duration::from_millis(5),
        ..Config::capture_all().without_delays()
    };
    (driver.clone(), Input::with_driver(driver, config))
}

fn press(key: Key) -> KeyStroke {
    KeyStroke {
        code: key.scan_code(),
        state: KeyState::DOWN.bits(),
        information: 0,
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn test_unload_twice_matches_unload_once() {
    let (driver, input) = setup();
    assert!(input.load());
    assert!(!input.load());
    assert_eq!(driver.contexts_created(), 1);

    input.unload();
    let after_once = (input.is_loaded(), driver.live_contexts(), driver.filters());
    input.unload();
    let after_twice = (input.is_loaded(), driver.live_contexts(), driver.filters());

    assert_eq!(after_once, after_twice);
    assert_eq!(
        after_once,
        (false, 0, (KeyboardFilter::NONE, MouseFilter::NONE))
    );
}

#[test]
fn test_input_passes_through_after_unload() {
    let (driver, input) = setup();
    let (_id, rx) = input.key_unbounded_channel();
    assert!(input.load());
    input.unload();

    assert!(!driver.inject_key(DeviceId(1), press(Key::KeyA)));
    assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());
}

#[test]
fn test_subscriptions_survive_reload() {
    let (driver, input) = setup();
    input.on_key(|event: &mut KeyEvent| event.key = Key::KeyZ);

    assert!(input.load());
    input.unload();
    assert!(input.load());

    driver.inject_key(DeviceId(1), press(Key::KeyA));
    let sent = driver.wait_for_sent(1, TIMEOUT);
    assert_eq!(sent, vec![(DeviceId(1), Stroke::Key(press(Key::KeyZ)))]);
}

#[test]
fn test_fatal_receive_tears_down_and_notifies() {
    let (driver, input) = setup();
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    input.on_fatal(move |error: &Error| {
        let _ = tx.lock().unwrap().send(error.clone());
    });
    assert!(input.load());

    driver.inject_receive_failure(DeviceId(13));

    let expected = Error::LoopFatal {
        device: DeviceId(13),
        code: 0,
    };
    assert_eq!(rx.recv_timeout(TIMEOUT), Ok(expected.clone()));
    assert!(!input.is_loaded());
    assert_eq!(input.last_error(), Some(expected.clone()));

    assert_eq!(input.try_unload(), Err(expected));
    assert_eq!(driver.live_contexts(), 0);
    assert_eq!(driver.filters(), (KeyboardFilter::NONE, MouseFilter::NONE));
    assert_eq!(input.try_unload(), Err(Error::NotLoaded));
}

#[test]
fn test_reload_after_fatal() {
    let (driver, input) = setup();
    assert!(input.load());
    driver.inject_receive_failure(DeviceId(1));
    assert!(wait_until(|| !input.is_loaded()));

    assert!(input.load());
    assert!(input.is_loaded());
    assert_eq!(input.last_error(), None);
    assert_eq!(driver.live_contexts(), 1);

    driver.inject_key(DeviceId(1), press(Key::KeyA));
    assert_eq!(driver.wait_for_sent(1, TIMEOUT).len(), 1);
}

#[test]
fn test_unload_from_subscriber() {
    let (driver, input) = setup();
    let input = Arc::new(input);
    let weak = Arc::downgrade(&input);
    input.on_key(move |event: &mut KeyEvent| {
        if event.key == Key::Escape {
            if let Some(input) = weak.upgrade() {
                input.unload();
            }
        }
    });
    assert!(input.load());

    driver.inject_key(DeviceId(1), press(Key::Escape));

    // The stroke that triggered the unload is still delivered.
    let sent = driver.wait_for_sent(1, TIMEOUT);
    assert_eq!(sent, vec![(DeviceId(1), Stroke::Key(press(Key::Escape)))]);
    assert!(wait_until(|| !input.is_loaded()));
    assert!(wait_until(|| driver.live_contexts() == 0));

    assert_eq!(input.try_unload(), Err(Error::NotLoaded));
    assert!(input.load());
    assert!(input.is_loaded());
}

#[test]
fn test_senders_fail_after_unload() {
    let (driver, input) = setup();
    assert!(input.load());
    input.send_key(Key::KeyA).expect("loaded");
    input.unload();

    assert_eq!(input.send_key(Key::KeyA), Err(Error::NotLoaded));
    assert_eq!(driver.sent().len(), 2);
}

#[test]
fn test_unavailable_driver() {
    let driver = Arc::new(MockDriver::unavailable());
    let input = Input::with_driver(driver.clone(), Config::capture_all());

    assert!(matches!(input.try_load(), Err(Error::DriverUnavailable(_))));
    assert!(!input.is_loaded());
    assert_eq!(input.try_unload(), Err(Error::NotLoaded));

    driver.set_available(true);
    assert!(input.driver_exists());
    assert!(!input.is_loaded());
}

#[test]
fn test_concurrent_senders_and_unload() {
    let (driver, input) = setup();
    let input = Arc::new(input);
    assert!(input.load());

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let input = input.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    match input.send_key(Key::KeyA) {
                        Ok(()) | Err(Error::NotLoaded) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            })
        })
        .collect();
    input.unload();
    for worker in workers {
        worker.join().expect("sender thread");
    }

    assert_eq!(driver.live_contexts(), 0);
    assert_eq!(driver.contexts_destroyed(), 1);
}

//! End-to-end interception behavior against the mock driver.

use interceptor::{
    Config, DeviceId, Input, Key, KeyEvent, KeyState, KeyStroke, KeyboardFilter, MockDriver,
    MouseEvent, MouseFilter, MouseState, MouseStroke, Stroke,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

fn setup(config: Config) -> (Arc<MockDriver>, Input<MockDriver>) {
    let driver = Arc::new(MockDriver::new());
    let config = Config {
        poll_interval: Duration::from_millis(5),
        ..config.without_delays()
    };
    (driver.clone(), Input::with_driver(driver, config))
}

fn key(key: Key, state: KeyState, information: u32) -> KeyStroke {
    KeyStroke {
        code: key.scan_code(),
        state: state.bits(),
        information,
    }
}

fn click(state: MouseState) -> MouseStroke {
    MouseStroke {
        state: state.bits(),
        ..Default::default()
    }
}

#[test]
fn test_escape_never_reaches_the_system() {
    let (driver, input) = setup(Config::capture_all());
    input.on_key(|event: &mut KeyEvent| {
        if event.key == Key::Escape {
            event.handled = true;
        }
    });
    assert!(input.load());

    let keyboard = DeviceId(1);
    driver.inject_key(keyboard, key(Key::Escape, KeyState::DOWN, 0));
    driver.inject_key(keyboard, key(Key::KeyA, KeyState::DOWN, 5));
    driver.inject_key(keyboard, key(Key::Escape, KeyState::UP, 0));
    driver.inject_key(keyboard, key(Key::KeyA, KeyState::UP, 6));

    let sent = driver.wait_for_sent(2, TIMEOUT);
    assert_eq!(
        sent,
        vec![
            (keyboard, Stroke::Key(key(Key::KeyA, KeyState::DOWN, 5))),
            (keyboard, Stroke::Key(key(Key::KeyA, KeyState::UP, 6))),
        ]
    );
}

#[test]
fn test_rewrite_changes_only_mutated_fields() {
    let (driver, input) = setup(Config::capture_all());
    input.on_key(|event: &mut KeyEvent| {
        if event.key == Key::CapsLock {
            event.key = Key::ControlLeft;
        }
    });
    assert!(input.load());

    driver.inject_key(DeviceId(3), key(Key::CapsLock, KeyState::UP, 0xBEEF));

    let sent = driver.wait_for_sent(1, TIMEOUT);
    assert_eq!(
        sent,
        vec![(DeviceId(3), Stroke::Key(key(Key::ControlLeft, KeyState::UP, 0xBEEF)))]
    );
}

#[test]
fn test_extended_to_plain_rewrite_drops_e0() {
    let (driver, input) = setup(Config::capture_all());
    input.on_key(|event: &mut KeyEvent| {
        if event.key == Key::ArrowUp {
            event.key = Key::KeyW;
        }
    });
    assert!(input.load());

    driver.inject_key(DeviceId(1), key(Key::ArrowUp, KeyState::E0, 7));
    driver.inject_key(DeviceId(1), key(Key::ArrowUp, KeyState::UP | KeyState::E0, 8));

    let sent = driver.wait_for_sent(2, TIMEOUT);
    assert_eq!(
        sent,
        vec![
            (DeviceId(1), Stroke::Key(key(Key::KeyW, KeyState::DOWN, 7))),
            (DeviceId(1), Stroke::Key(key(Key::KeyW, KeyState::UP, 8))),
        ]
    );
}

#[test]
fn test_plain_to_extended_rewrite_adds_e0() {
    let (driver, input) = setup(Config::capture_all());
    input.on_key(|event: &mut KeyEvent| {
        if event.key == Key::KeyW {
            event.key = Key::ArrowUp;
        }
    });
    assert!(input.load());

    driver.inject_key(DeviceId(1), key(Key::KeyW, KeyState::UP, 0));

    let sent = driver.wait_for_sent(1, TIMEOUT);
    assert_eq!(
        sent,
        vec![(DeviceId(1), Stroke::Key(key(Key::ArrowUp, KeyState::UP | KeyState::E0, 0)))]
    );
}

#[test]
fn test_prefixed_strokes_are_not_plain_keys() {
    let (driver, input) = setup(Config::capture_all());
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    input.on_key(move |event: &mut KeyEvent| {
        sink.lock().unwrap().push(event.key);
        if matches!(event.key, Key::NumpadMultiply | Key::ControlLeft | Key::ShiftLeft) {
            event.handled = true;
        }
    });
    assert!(input.load());

    let print_screen = KeyStroke {
        code: 0x37,
        state: KeyState::E0.bits(),
        information: 0,
    };
    let pause = KeyStroke {
        code: 0x1D,
        state: KeyState::E1.bits(),
        information: 0,
    };
    let fake_shift = KeyStroke {
        code: 0x2A,
        state: (KeyState::UP | KeyState::E0).bits(),
        information: 0,
    };
    for stroke in [print_screen, pause, fake_shift] {
        driver.inject_key(DeviceId(1), stroke);
    }

    assert_eq!(
        driver.wait_for_sent(3, TIMEOUT),
        vec![
            (DeviceId(1), Stroke::Key(print_screen)),
            (DeviceId(1), Stroke::Key(pause)),
            (DeviceId(1), Stroke::Key(fake_shift)),
        ]
    );
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Key::Unknown(0x37), Key::Unknown(0x1D), Key::Unknown(0x2A)]
    );
}

#[test]
fn test_swapped_buttons_deliver_opposite_clicks() {
    let (driver, input) = setup(Config::capture_all());
    input.on_mouse(|event: &mut MouseEvent| {
        let swapped = [
            (MouseState::LEFT_DOWN, MouseState::RIGHT_DOWN),
            (MouseState::LEFT_UP, MouseState::RIGHT_UP),
            (MouseState::RIGHT_DOWN, MouseState::LEFT_DOWN),
            (MouseState::RIGHT_UP, MouseState::LEFT_UP),
        ]
        .into_iter()
        .find(|(from, _)| *from == event.state);
        if let Some((_, to)) = swapped {
            event.state = to;
        }
    });
    assert!(input.load());

    let mouse = DeviceId(11);
    driver.inject_mouse(mouse, click(MouseState::LEFT_DOWN));
    driver.inject_mouse(mouse, click(MouseState::LEFT_UP));
    driver.inject_mouse(mouse, click(MouseState::RIGHT_DOWN));
    driver.inject_mouse(mouse, click(MouseState::RIGHT_UP));

    let states: Vec<MouseState> = driver
        .wait_for_sent(4, TIMEOUT)
        .into_iter()
        .map(|(_, stroke)| match stroke {
            Stroke::Mouse(mouse) => MouseState::from_bits_retain(mouse.state),
            Stroke::Key(_) => panic!("unexpected keyboard stroke"),
        })
        .collect();
    assert_eq!(
        states,
        vec![
            MouseState::RIGHT_DOWN,
            MouseState::RIGHT_UP,
            MouseState::LEFT_DOWN,
            MouseState::LEFT_UP,
        ]
    );
}

#[test]
fn test_no_filter_means_no_dispatch() {
    let config = Config {
        keyboard_filter: KeyboardFilter::NONE,
        mouse_filter: MouseFilter::ALL,
        ..Config::default()
    };
    let (driver, input) = setup(config);
    let keys = Arc::new(AtomicUsize::new(0));
    let counter = keys.clone();
    input.on_key(move |_: &mut KeyEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(input.load());

    assert!(!driver.inject_key(DeviceId(1), key(Key::KeyA, KeyState::DOWN, 0)));
    assert!(driver.inject_mouse(DeviceId(12), click(MouseState::MIDDLE_DOWN)));

    // The mouse stroke went through the loop, so the key would have too.
    assert_eq!(driver.wait_for_sent(1, TIMEOUT).len(), 1);
    assert_eq!(keys.load(Ordering::SeqCst), 0);
    assert_eq!(driver.passed_through().len(), 1);
}

#[test]
fn test_key_down_filter_lets_releases_pass() {
    let config = Config {
        keyboard_filter: KeyboardFilter::KEY_DOWN,
        ..Config::default()
    };
    let (driver, input) = setup(config);
    assert!(input.load());

    assert!(driver.inject_key(DeviceId(1), key(Key::KeyA, KeyState::DOWN, 0)));
    assert!(!driver.inject_key(DeviceId(1), key(Key::KeyA, KeyState::UP, 0)));
}

#[test]
fn test_subscribers_see_earlier_rewrites() {
    let (driver, input) = setup(Config::capture_all());
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    input.on_key(|event: &mut KeyEvent| event.key = Key::KeyB);
    let sink = seen.clone();
    input.on_key(move |event: &mut KeyEvent| sink.lock().unwrap().push(event.key));
    assert!(input.load());

    driver.inject_key(DeviceId(1), key(Key::KeyA, KeyState::DOWN, 0));
    driver.wait_for_sent(1, TIMEOUT);
    assert_eq!(*seen.lock().unwrap(), vec![Key::KeyB]);
}

#[test]
fn test_unknown_scan_codes_survive() {
    let (driver, input) = setup(Config::capture_all());
    let seen = Arc::new(std::sync::Mutex::new(None));
    let sink = seen.clone();
    input.on_key(move |event: &mut KeyEvent| *sink.lock().unwrap() = Some(event.key));
    assert!(input.load());

    let odd = KeyStroke {
        code: 0x76,
        state: KeyState::DOWN.bits(),
        information: 0,
    };
    driver.inject_key(DeviceId(1), odd);
    assert_eq!(driver.wait_for_sent(1, TIMEOUT), vec![(DeviceId(1), Stroke::Key(odd))]);
    assert_eq!(*seen.lock().unwrap(), Some(Key::Unknown(0x76)));
}

#[test]
fn test_text_round_trip() {
    let (driver, input) = setup(Config::default());
    assert!(input.load());
    input.send_text("Hello!").expect("send text");

    let tap = |k: Key| [(k.scan_code(), KeyState::DOWN), (k.scan_code(), KeyState::UP)];
    let shift_down = (Key::ShiftLeft.scan_code(), KeyState::DOWN);
    let shift_up = (Key::ShiftLeft.scan_code(), KeyState::UP);

    let mut want = vec![shift_down];
    want.extend(tap(Key::KeyH));
    want.push(shift_up);
    for k in [Key::KeyE, Key::KeyL, Key::KeyL, Key::KeyO] {
        want.extend(tap(k));
    }
    want.push(shift_down);
    want.extend(tap(Key::Num1));
    want.push(shift_up);

    let got: Vec<(u16, KeyState)> = driver
        .sent()
        .into_iter()
        .map(|(device, stroke)| {
            assert_eq!(device, DeviceId(2));
            match stroke {
                Stroke::Key(k) => (k.code, KeyState::from_bits_retain(k.state)),
                Stroke::Mouse(_) => panic!("unexpected mouse stroke"),
            }
        })
        .collect();
    assert_eq!(got, want);
}

#[test]
fn test_send_keys_order() {
    let (driver, input) = setup(Config::default());
    assert!(input.load());
    input
        .send_keys(&[Key::KeyA, Key::KeyB, Key::KeyC])
        .expect("send keys");

    let got: Vec<(Key, bool)> = driver
        .sent()
        .into_iter()
        .filter_map(|(_, stroke)| match stroke {
            Stroke::Key(k) => {
                let state = KeyState::from_bits_retain(k.state);
                Some((Key::from_stroke(k.code, state), state.is_down()))
            }
            Stroke::Mouse(_) => None,
        })
        .collect();
    assert_eq!(
        got,
        vec![
            (Key::KeyA, true),
            (Key::KeyA, false),
            (Key::KeyB, true),
            (Key::KeyB, false),
            (Key::KeyC, true),
            (Key::KeyC, false),
        ]
    );
}

#[test]
fn test_synthetic_input_targets_last_active_device() {
    let (driver, input) = setup(Config::capture_all());
    assert!(input.load());
    assert_eq!(input.current_keyboard(), DeviceId(2));

    driver.inject_key(DeviceId(4), key(Key::KeyQ, KeyState::DOWN, 0));
    driver.wait_for_sent(1, TIMEOUT);
    assert_eq!(input.current_keyboard(), DeviceId(4));

    driver.clear_sent();
    input.send_key(Key::KeyW).expect("send");
    assert!(driver.sent().iter().all(|(device, _)| *device == DeviceId(4)));
}

#[test]
fn test_untracked_devices_keep_defaults() {
    let config = Config {
        track_devices: false,
        default_mouse: DeviceId(15),
        ..Config::capture_all()
    };
    let (driver, input) = setup(config);
    assert!(input.load());

    driver.inject_mouse(DeviceId(12), click(MouseState::LEFT_DOWN));
    driver.wait_for_sent(1, TIMEOUT);
    assert_eq!(input.current_mouse(), DeviceId(15));
}

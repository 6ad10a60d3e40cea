// crates/input_core/tests/profiles.rs
use std::fs;

use input_core::input::FlagSets;
use input_core::{ControllerConfig, DeviceState, InputController, InputDefaults};
use input_shared::{BindingSet, InputDefinition, InputDevice};
use tempfile::TempDir;

fn controller(tmp: &TempDir) -> InputController<DeviceState> {
    let config = ControllerConfig::default().with_profiles_dir(tmp.path());
    let mut controller = InputController::new(config, InputDefaults::definitions(), DeviceState::new());
    controller.init();
    controller
}

/// Rebinds Jump's keyboard slot to `key` through the capture flow.
fn rebind_jump(controller: &mut InputController<DeviceState>, key: &str) {
    controller.rebind("Jump", InputDevice::Keyboard, None, |_| {}, |reason| panic!("cancelled: {reason:?}"));
    controller.backend_mut().press(key);
    controller.tick(0.016);
    controller.backend_mut().release(key);
    controller.tick(0.016);
}

#[test]
fn save_then_load_on_a_fresh_controller_round_trips() {
    let tmp = TempDir::new().unwrap();
    let mut first = controller(&tmp);
    rebind_jump(&mut first, "<Keyboard>/j");
    first.is_analog_gamepad("Move", Some(true));
    first.is_inverted_y("Look", Some(true));
    first.is_analog_keyboard("Look", Some(false));
    first.profile_save("p1").unwrap();

    let mut second = controller(&tmp);
    assert!(second.profile_load("p1"));

    assert_eq!(second.graph().export_overrides(), first.graph().export_overrides());
    assert_eq!(second.flag_sets(), first.flag_sets());
    assert_eq!(second.binding_display("Jump", InputDevice::Keyboard, None).as_deref(), Some("J"));
    assert!(second.get("Move").unwrap().use_analog_gamepad());
}

#[test]
fn save_clears_dirty_and_mutations_set_it_again() {
    let tmp = TempDir::new().unwrap();
    let mut controller = controller(&tmp);
    assert!(controller.profile_can_be_saved("p1"));

    controller.profile_save("p1").unwrap();
    assert!(!controller.profile_can_be_saved("p1"));

    controller.is_inverted_y("Move", Some(true));
    assert!(controller.profile_can_be_saved("p1"));
    controller.is_inverted_y("Move", Some(false));
    assert!(!controller.profile_can_be_saved("p1"));

    rebind_jump(&mut controller, "<Keyboard>/k");
    assert!(controller.profile_can_be_saved("p1"));
}

#[test]
fn checking_for_changes_never_writes() {
    let tmp = TempDir::new().unwrap();
    let controller = controller(&tmp);

    assert!(controller.profile_can_be_saved("ghost"));
    assert!(!controller.profile_exists("ghost"));
    assert!(controller.profiles().is_empty());
}

#[test]
fn reset_persists_only_into_existing_profiles() {
    let tmp = TempDir::new().unwrap();
    let mut controller = controller(&tmp);
    rebind_jump(&mut controller, "<Keyboard>/j");
    controller.profile_save("p1").unwrap();

    controller.reset_bindings_to_default(Some("p1"));
    assert_eq!(controller.graph().export_overrides(), r#"{"bindings":[]}"#);
    assert!(!controller.profile_can_be_saved("p1"));

    controller.reset_bindings_to_default(Some("never-saved"));
    assert!(!controller.profile_exists("never-saved"));
}

#[test]
fn reset_restores_seeded_flags() {
    let tmp = TempDir::new().unwrap();
    let mut controller = controller(&tmp);
    let seeded = controller.flag_sets().clone();

    controller.is_analog_keyboard("Look", Some(false));
    controller.is_analog_gamepad("Move", Some(true));
    controller.reset_bindings_to_default(None);

    assert_eq!(*controller.flag_sets(), seeded);
    assert!(controller.get("Look").unwrap().use_analog_keyboard());
}

#[test]
fn corrupt_profile_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("default.json"), "{ definitely not json").unwrap();

    let mut controller = controller(&tmp);
    assert!(controller.is_analog_keyboard("Look", None));
    assert_eq!(controller.graph().export_overrides(), r#"{"bindings":[]}"#);

    fs::write(tmp.path().join("bad_blob.json"), r#"{"bindingOverrides":"{oops"}"#).unwrap();
    assert!(!controller.profile_load("bad_blob"));
    assert!(controller.is_analog_keyboard("Look", None));
}

#[test]
fn default_profile_is_loaded_on_init() {
    let tmp = TempDir::new().unwrap();
    let mut flags = FlagSets::default();
    flags.inverted_y.insert("Look".to_string());
    let record = input_core::ProfileRecord::new("", &flags);
    input_core::ProfileStore::new(tmp.path()).save("default", &record).unwrap();

    let mut controller = controller(&tmp);
    assert!(controller.is_inverted_y("Look", None));
    // Loaded sets replace the seed entirely.
    assert!(!controller.is_analog_keyboard("Look", None));
}

#[test]
fn listing_and_deleting_profiles() {
    let tmp = TempDir::new().unwrap();
    let mut controller = controller(&tmp);
    controller.profile_save("beta").unwrap();
    controller.profile_save("alpha").unwrap();

    assert_eq!(controller.profiles(), vec!["alpha", "beta"]);
    assert_eq!(controller.current_profile(), Some("alpha"));

    assert!(controller.profile_delete("alpha").unwrap());
    assert_eq!(controller.current_profile(), None);
    assert_eq!(controller.profiles(), vec!["beta"]);
    assert!(controller.profile_save("../escape").is_err());
}

#[test]
fn blank_names_address_the_default_profile() {
    let tmp = TempDir::new().unwrap();
    let mut controller = controller(&tmp);
    controller.is_inverted_y("Move", Some(true));

    controller.profile_save("").unwrap();
    controller.profile_save("  ").unwrap();
    assert_eq!(controller.profiles(), vec!["default"]);
    assert!(controller.profile_exists(" "));
    assert!(!controller.profile_can_be_saved(""));

    controller.is_inverted_y("Move", Some(false));
    assert!(controller.profile_load("\t"));
    assert_eq!(controller.current_profile(), Some("default"));
    assert!(controller.is_inverted_y("Move", None));
}

#[test]
fn overrides_survive_a_rebuild() {
    let tmp = TempDir::new().unwrap();
    let mut controller = controller(&tmp);
    rebind_jump(&mut controller, "<Keyboard>/j");
    controller.set_repeat("Jump", 0.3, 0.1).unwrap();

    let mut definitions = InputDefaults::definitions();
    definitions.push(InputDefinition::button(
        "Crouch",
        BindingSet::button("<Keyboard>/c"),
        BindingSet::button("<Gamepad>/buttonEast"),
    ));
    controller.rebuild(definitions);

    assert_eq!(controller.binding_display("Jump", InputDevice::Keyboard, None).as_deref(), Some("J"));
    assert_eq!(controller.get("Jump").unwrap().repeat().start_delay, 0.3);
    assert!(controller.get("Crouch").unwrap().is_enabled());

    controller.backend_mut().press("<Keyboard>/j");
    controller.tick(0.016);
    assert!(controller.get("Jump").unwrap().is_pressed());
}

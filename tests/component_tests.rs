//! Component & Modifier Tests
//!
//! Tests for:
//! - Typed component storage: replace-on-add, lookups, removal
//! - Dispatch order (modifiers before components, insertion order within)
//! - Hooks mutating their node
//! - Hook failure policies
//! - Scene settings (serde)

use std::cell::RefCell;
use std::rc::Rc;

use arbor::prelude::*;
use arbor::scene::UpdateStats;

type CallLog = Rc<RefCell<Vec<&'static str>>>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scene_with_root(settings: SceneSettings) -> (Scene, NodeHandle) {
    init_logger();
    let mut scene = Scene::with_settings(settings);
    let root = scene.create_node("root");
    scene.set_root(root).unwrap();
    (scene, root)
}

// ============================================================================
// Test hooks
// ============================================================================

#[derive(Debug, PartialEq)]
struct Health(u32);
impl Component for Health {}

struct Recorder {
    label: &'static str,
    log: CallLog,
}

impl Component for Recorder {
    fn update(&mut self, _node: &mut Node, _dt: f32) -> HookResult {
        self.log.borrow_mut().push(self.label);
        Ok(())
    }
}

struct OtherRecorder {
    label: &'static str,
    log: CallLog,
}

impl Component for OtherRecorder {
    fn update(&mut self, _node: &mut Node, _dt: f32) -> HookResult {
        self.log.borrow_mut().push(self.label);
        Ok(())
    }
}

struct ModRecorder {
    log: CallLog,
}

impl Modifier for ModRecorder {
    fn update(&mut self, _node: &mut Node, _dt: f32) -> HookResult {
        self.log.borrow_mut().push("modifier");
        Ok(())
    }
}

/// Spins the node around Y at a fixed rate.
struct Spin {
    speed: f32,
}

impl Modifier for Spin {
    fn update(&mut self, node: &mut Node, dt: f32) -> HookResult {
        let local = *node.local_transform() * Affine3A::from_rotation_y(self.speed * dt);
        node.set_local_transform(local);
        Ok(())
    }
}

/// Fails every frame.
struct Broken;

impl Component for Broken {
    fn update(&mut self, _node: &mut Node, _dt: f32) -> HookResult {
        Err(HookError::msg("broken on purpose"))
    }
}

/// Adds a [`Health`] to its node from inside the hook pass.
struct Spawner;

impl Component for Spawner {
    fn update(&mut self, node: &mut Node, _dt: f32) -> HookResult {
        if !node.has_component::<Health>() {
            node.add_component(Health(100));
        }
        Ok(())
    }
}

// ============================================================================
// Storage
// ============================================================================

#[test]
fn component_add_replaces_same_type() {
    let mut node = Node::new("n");
    assert!(!node.add_component(Health(10)));
    assert!(node.add_component(Health(20)));

    assert_eq!(node.component_count(), 1);
    assert_eq!(node.modifier_count(), 0);
    assert_eq!(node.get_component::<Health>().unwrap(), &Health(20));
}

#[test]
fn component_lookup_miss_is_error() {
    let node = Node::new("n");
    assert!(matches!(
        node.get_component::<Health>(),
        Err(SceneError::ComponentNotFound(_))
    ));
    assert!(matches!(
        node.get_modifier::<Spin>(),
        Err(SceneError::ComponentNotFound(_))
    ));
}

#[test]
fn component_get_mut_and_remove() {
    let mut node = Node::new("n");
    node.add_component(Health(1));
    node.get_component_mut::<Health>().unwrap().0 = 42;

    assert_eq!(node.remove_component::<Health>(), Some(Health(42)));
    assert!(!node.has_component::<Health>());
    assert_eq!(node.remove_component::<Health>(), None);
}

#[test]
fn scene_component_shortcuts() {
    let (mut scene, root) = scene_with_root(SceneSettings::default());
    scene.add_component(root, Health(5)).unwrap();

    assert!(scene.has_component::<Health>(root));
    scene.get_component_mut::<Health>(root).unwrap().0 += 1;
    assert_eq!(scene.get_component::<Health>(root).unwrap().0, 6);

    scene.destroy_node(root).unwrap();
    assert!(!scene.has_component::<Health>(root));
    assert!(matches!(
        scene.add_component(root, Health(1)),
        Err(SceneError::AlreadyDestroyed(_))
    ));
}

// ============================================================================
// Dispatch order
// ============================================================================

#[test]
fn hooks_run_modifiers_first_then_components_in_insertion_order() {
    let (mut scene, root) = scene_with_root(SceneSettings::default());
    let log: CallLog = Rc::default();

    scene
        .node(root)
        .with_component(OtherRecorder {
            label: "second-type",
            log: log.clone(),
        })
        .with_component(Recorder {
            label: "first-type",
            log: log.clone(),
        })
        .with_modifier(ModRecorder { log: log.clone() });

    scene.update(0.016);

    assert_eq!(*log.borrow(), vec!["modifier", "second-type", "first-type"]);
}

#[test]
fn replacing_a_component_keeps_its_dispatch_position() {
    let (mut scene, root) = scene_with_root(SceneSettings::default());
    let log: CallLog = Rc::default();

    scene
        .node(root)
        .with_component(Recorder {
            label: "a",
            log: log.clone(),
        })
        .with_component(OtherRecorder {
            label: "b",
            log: log.clone(),
        })
        .with_component(Recorder {
            label: "a2",
            log: log.clone(),
        });

    scene.update(0.016);

    assert_eq!(*log.borrow(), vec!["a2", "b"]);
}

#[test]
fn parent_hooks_run_before_children() {
    let (mut scene, root) = scene_with_root(SceneSettings::default());
    let child = scene.add_child_named(root, "child").unwrap();
    let log: CallLog = Rc::default();

    scene.node(child).with_component(Recorder {
        label: "child",
        log: log.clone(),
    });
    scene.node(root).with_component(Recorder {
        label: "root",
        log: log.clone(),
    });

    scene.update(0.016);

    assert_eq!(*log.borrow(), vec!["root", "child"]);
}

#[test]
fn modifier_changes_local_before_propagation() {
    let (mut scene, root) = scene_with_root(SceneSettings::default());
    let child = scene.add_child_named(root, "child").unwrap();
    scene.node(root).with_modifier(Spin {
        speed: std::f32::consts::PI,
    });

    scene.update(0.5);

    let expected = Affine3A::from_rotation_y(std::f32::consts::FRAC_PI_2);
    assert!(
        scene
            .get_node(child)
            .unwrap()
            .world_transform()
            .abs_diff_eq(expected, 1e-5)
    );
}

#[test]
fn components_added_during_update_are_kept() {
    let (mut scene, root) = scene_with_root(SceneSettings::default());
    scene.node(root).with_component(Spawner);

    scene.update(0.016);

    assert!(scene.has_component::<Spawner>(root));
    assert_eq!(scene.get_component::<Health>(root).unwrap().0, 100);

    // Order after the merge: original entries, then the additions
    let order: Vec<&str> = scene
        .get_node(root)
        .unwrap()
        .components()
        .keys()
        .map(|k| k.name())
        .collect();
    assert_eq!(order.len(), 2);
    assert!(order[0].ends_with("Spawner"));
    assert!(order[1].ends_with("Health"));
}

// ============================================================================
// Hook failure
// ============================================================================

#[test]
fn failing_hook_skips_subtree_by_default() {
    let (mut scene, root) = scene_with_root(SceneSettings::default());
    let bad = scene.add_child_named(root, "bad").unwrap();
    let bad_child = scene.add_child_named(bad, "bad_child").unwrap();
    let good = scene.add_child_named(root, "good").unwrap();

    scene
        .node(root)
        .set_local(Affine3A::from_translation(Vec3::new(0.0, 3.0, 0.0)));
    scene.node(bad).with_component(Broken);

    let stats = scene.update(0.016);

    assert_eq!(
        stats,
        UpdateStats {
            visited: 2,
            hook_failures: 1,
            skipped: 1,
        }
    );
    // The failing node and its subtree keep their previous state
    assert_eq!(
        *scene.get_node(bad).unwrap().world_transform(),
        Affine3A::IDENTITY
    );
    assert_eq!(
        *scene.get_node(bad_child).unwrap().world_transform(),
        Affine3A::IDENTITY
    );
    // Siblings still update
    let good_pos: Vec3 = scene.get_node(good).unwrap().world_transform().translation.into();
    assert!((good_pos - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-5);
}

#[test]
fn failing_hook_with_continue_policy_updates_node() {
    let settings = SceneSettings {
        hook_failure: HookFailurePolicy::Continue,
        ..Default::default()
    };
    let (mut scene, root) = scene_with_root(settings);
    let bad = scene.add_child_named(root, "bad").unwrap();
    let bad_child = scene.add_child_named(bad, "bad_child").unwrap();
    scene
        .node(root)
        .set_local(Affine3A::from_translation(Vec3::new(0.0, 3.0, 0.0)));
    scene.node(bad).with_component(Broken);

    let stats = scene.update(0.016);

    assert_eq!(stats.hook_failures, 1);
    assert_eq!(stats.visited, 3);
    let child_pos: Vec3 = scene
        .get_node(bad_child)
        .unwrap()
        .world_transform()
        .translation
        .into();
    assert!((child_pos - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-5);
}

#[test]
fn failing_modifier_stops_components_of_that_node() {
    struct BrokenModifier;
    impl Modifier for BrokenModifier {
        fn update(&mut self, _node: &mut Node, _dt: f32) -> HookResult {
            Err(HookError::from(Box::<dyn std::error::Error + Send + Sync>::from(
                "modifier failed",
            )))
        }
    }

    let (mut scene, root) = scene_with_root(SceneSettings::default());
    let log: CallLog = Rc::default();
    scene
        .node(root)
        .with_modifier(BrokenModifier)
        .with_component(Recorder {
            label: "component",
            log: log.clone(),
        });

    let stats = scene.update(0.016);

    assert_eq!(stats.hook_failures, 1);
    assert!(log.borrow().is_empty());
    // The failing modifier is still attached for the next frame
    assert!(scene.get_node(root).unwrap().has_modifier::<BrokenModifier>());
}

#[test]
fn continue_policy_skips_remaining_hooks_but_updates_transform() {
    struct FailingModifier;
    impl Modifier for FailingModifier {
        fn update(&mut self, _node: &mut Node, _dt: f32) -> HookResult {
            Err(HookError::msg("modifier failed"))
        }
    }

    let settings = SceneSettings {
        hook_failure: HookFailurePolicy::Continue,
        ..Default::default()
    };
    let (mut scene, root) = scene_with_root(settings);
    let node = scene.add_child_named(root, "node").unwrap();
    let log: CallLog = Rc::default();
    scene
        .node(root)
        .set_local(Affine3A::from_translation(Vec3::new(2.0, 0.0, 0.0)));
    scene
        .node(node)
        .with_modifier(FailingModifier)
        .with_component(Recorder {
            label: "component",
            log: log.clone(),
        });

    let stats = scene.update(0.016);

    assert_eq!(stats.hook_failures, 1);
    assert_eq!(stats.visited, 2);
    assert!(log.borrow().is_empty(), "components after a failed modifier do not run");
    let pos: Vec3 = scene.get_node(node).unwrap().world_transform().translation.into();
    assert!((pos - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn settings_default_values() {
    let settings = SceneSettings::default();
    assert_eq!(settings.hook_failure, HookFailurePolicy::SkipSubtree);
    assert!(settings.warn_unattached);
}

#[test]
fn settings_deserialize_with_missing_fields() {
    let settings: SceneSettings = serde_json::from_str(r#"{ "hook_failure": "continue" }"#).unwrap();
    assert_eq!(settings.hook_failure, HookFailurePolicy::Continue);
    assert!(settings.warn_unattached);

    let empty: SceneSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, SceneSettings::default());
}

#[test]
fn settings_serialize_snake_case() {
    let json = serde_json::to_string(&SceneSettings::default()).unwrap();
    assert!(json.contains("\"skip_subtree\""));
}

#[test]
fn scene_settings_mut_changes_policy() {
    let (mut scene, root) = scene_with_root(SceneSettings::default());
    let child = scene.add_child_named(root, "child").unwrap();
    scene.node(root).with_component(Broken);

    assert_eq!(scene.update(0.016).skipped, 1);

    scene.settings_mut().hook_failure = HookFailurePolicy::Continue;
    assert_eq!(scene.update(0.016).visited, 2);
    assert!(scene.contains(child));
}

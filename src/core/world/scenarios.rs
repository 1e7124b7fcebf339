//=========================================================================
// World Scenarios
//=========================================================================
//
// End-to-end behaviour through the public `World` API: clock passes,
// twin reconciliation, the power graph, holders, chargers, doors and
// consoles.
//
//=========================================================================

use std::time::Duration;

use proptest::prelude::*;

use super::*;
use crate::core::config::WorldConfig;
use crate::core::effects::{AudioCue, GameFlow, VisualEffect};
use crate::core::entity::EntityId;
use crate::core::error::WorldError;
use crate::core::math::{Pose, Vec3};
use crate::core::object::{ObjectSettings, TimelineObject, VisualBucket};
use crate::core::power::{
    CardConsole, ConsoleScreen, DoorMotion, HolderShield, RotateEnergy, TimeBattery, TimeCharger, TimeDoor,
};
use crate::core::shield::ShieldItem;
use crate::core::time::TimeState;
use crate::core::twin::TwinLink;

//=== Fixtures ============================================================

fn world() -> World {
    World::new(WorldConfig::new().with_time_travel_delay(Duration::ZERO))
}

/// Advances the world in 100 ms steps.
fn run_for(world: &mut World, secs: f32) {
    let steps = (secs / 0.1).round() as usize;
    for _ in 0..steps {
        world.tick(Duration::from_millis(100));
        world.fixed_update();
    }
}

fn object(world: &World, id: EntityId) -> &TimelineObject {
    world.entity(id).and_then(|e| e.object.as_ref()).expect("timeline object")
}

fn visible(world: &World, id: EntityId) -> bool {
    world.entity(id).expect("entity").visible
}

fn broken(world: &World, id: EntityId) -> bool {
    object(world, id).condition().is_broken()
}

fn protected(world: &World, id: EntityId) -> bool {
    object(world, id).condition().is_protected()
}

fn door(world: &World, id: EntityId) -> &TimeDoor {
    world.entity(id).and_then(|e| e.door.as_ref()).expect("door")
}

fn powered(world: &World, id: EntityId) -> bool {
    world
        .entity(id)
        .and_then(|e| e.switch.as_ref())
        .is_some_and(RotateEnergy::is_powered)
}

/// Spawns a linked pair; the L1 half is pickable.
fn twin_pair(world: &mut World) -> (EntityId, EntityId) {
    let l1 = world.spawn(
        EntityBuilder::new("crate (L1)")
            .at(Pose::at(Vec3::new(1.0, 0.0, 0.0)))
            .timeline_object()
            .pickable()
            .twin("crate", TimeState::L1),
    );
    let origin = world.spawn(
        EntityBuilder::new("crate (Origin)")
            .at(Pose::at(Vec3::new(1.0, 0.0, 0.0)))
            .timeline_object()
            .pickable()
            .twin("crate", TimeState::Origin),
    );
    world.link_twins(l1, origin).expect("link");
    (l1, origin)
}

fn link(world: &World, id: EntityId) -> &TwinLink {
    world.entity(id).and_then(|e| e.twin.as_ref()).expect("twin link")
}

//=== Timeline Objects ====================================================

#[test]
fn protected_object_stays_intact_in_origin() {
    let mut world = world();
    let settings = ObjectSettings { start_protected: true, ..ObjectSettings::default() };
    let lamp = world.spawn(EntityBuilder::new("lamp").object(settings));

    world.change_time(TimeState::Origin);

    assert!(!broken(&world, lamp));
    assert_eq!(object(&world, lamp).visuals().active(), Some(VisualBucket::OriginOk));
}

#[test]
fn round_trip_returns_to_origin_pose() {
    let mut world = world();
    let start = Pose::at(Vec3::new(2.0, 0.0, -1.0));
    let chair = world.spawn(EntityBuilder::new("chair").at(start).timeline_object().with_body());

    world.change_time(TimeState::L1);
    world.change_time(TimeState::Origin);

    assert_eq!(world.entity(chair).map(|e| e.pose), Some(start));
    assert!(broken(&world, chair));
}

#[test]
fn held_object_defers_until_dropped() {
    let mut world = world();
    let cup = world.spawn(EntityBuilder::new("cup").timeline_object().pickable());
    let in_hand = Pose::at(Vec3::new(0.0, 1.5, 3.0));

    assert!(world.grab(cup).unwrap());
    world.move_entity(cup, in_hand).unwrap();
    world.change_time(TimeState::L1);

    assert!(broken(&world, cup));
    assert_eq!(object(&world, cup).deferred(), Some(TimeState::L1));

    assert!(world.drop_held(cup).unwrap());
    assert!(!broken(&world, cup));
    assert_eq!(object(&world, cup).visuals().active(), Some(VisualBucket::L1));
    assert_eq!(world.entity(cup).map(|e| e.pose), Some(in_hand));
}

#[test]
fn portal_trip_moves_only_the_traveller() {
    let mut world = world();
    let vase = world.spawn(EntityBuilder::new("vase").timeline_object());
    let table = world.spawn(EntityBuilder::new("table").timeline_object());
    world.drain_effects();

    assert!(world.request_object_time_travel(vase, TimeState::L1).unwrap());

    assert_eq!(world.current_time(), TimeState::Origin);
    assert!(!broken(&world, vase));
    assert!(broken(&world, table));
    assert!(!world.is_cooling_down());
    assert_eq!(
        world.drain_effects().flow,
        vec![GameFlow::ObjectTravelled { entity: vase, target: TimeState::L1 }]
    );
}

#[test]
fn toggle_waits_for_cooldown_then_resumes() {
    let mut world = World::default();
    world.drain_effects();

    assert!(world.toggle_time());
    assert!(!world.toggle_time());
    assert_eq!(
        world.drain_effects().flow,
        vec![GameFlow::TimeChanged { from: TimeState::Origin, to: TimeState::L1 }]
    );

    world.tick(Duration::from_secs(3));
    assert_eq!(world.drain_effects().flow, vec![GameFlow::Resumed]);
    assert!(world.toggle_time());
    assert_eq!(world.current_time(), TimeState::Origin);
    assert_eq!(world.previous_time(), TimeState::L1);
}

//=== Twins ===============================================================

#[test]
fn held_l1_half_stays_visible_across_both_crossings() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let (l1, origin) = twin_pair(&mut world);
    assert!(visible(&world, l1));
    assert!(!visible(&world, origin));

    world.grab(l1).unwrap();

    world.change_time(TimeState::Origin);
    assert!(visible(&world, l1));
    assert!(!visible(&world, origin));

    world.change_time(TimeState::L1);
    assert!(visible(&world, l1));
    assert!(!visible(&world, origin));

    world.drop_held(l1).unwrap();
    run_for(&mut world, 0.3);
    assert!(visible(&world, l1));
    assert!(!visible(&world, origin));

    world.change_time(TimeState::Origin);
    assert!(!visible(&world, l1));
    assert!(visible(&world, origin));
}

#[test]
fn l1_half_left_in_origin_replaces_its_sibling() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let (l1, origin) = twin_pair(&mut world);

    world.grab(l1).unwrap();
    world.change_time(TimeState::Origin);
    world.drop_held(l1).unwrap();
    run_for(&mut world, 0.3);

    let link = world.entity(l1).and_then(|e| e.twin.as_ref()).unwrap();
    assert_eq!(link.physical_timeline(), TimeState::Origin);
    assert!(visible(&world, l1));
    assert!(!visible(&world, origin));

    // Still parked in Origin after a round trip through L1
    world.change_time(TimeState::L1);
    assert!(!visible(&world, l1));
    world.change_time(TimeState::Origin);
    assert!(visible(&world, l1));
    assert!(!visible(&world, origin));
}

#[test]
fn regrab_cancels_pending_drop_notice() {
    let mut world = world();
    let (l1, _) = twin_pair(&mut world);

    world.grab(l1).unwrap();
    world.drop_held(l1).unwrap();
    assert!(world.drop_notice_pending(l1));

    world.grab(l1).unwrap();
    assert!(!world.drop_notice_pending(l1));
}

#[test]
fn link_rejects_bad_pairs() {
    let mut world = world();
    let a = world.spawn(EntityBuilder::new("a").timeline_object().twin("x", TimeState::Origin));
    let b = world.spawn(EntityBuilder::new("b").timeline_object().twin("x", TimeState::Origin));
    let plain = world.spawn(EntityBuilder::new("plain").timeline_object());

    assert_eq!(world.link_twins(a, a), Err(WorldError::SelfLink(a)));
    assert_eq!(world.link_twins(a, b), Err(WorldError::SameTimelineTwins { a, b }));
    assert!(matches!(
        world.link_twins(a, plain),
        Err(WorldError::MissingComponent { component: "twin link", .. })
    ));
}

#[test]
fn destroying_a_half_unlinks_its_sibling() {
    let mut world = world();
    let (l1, origin) = twin_pair(&mut world);
    assert_eq!(world.observer_count(), 4);

    world.destroy(origin).unwrap();

    assert_eq!(world.entity(l1).and_then(|e| e.twin.as_ref()).unwrap().twin, None);
    assert_eq!(world.observer_count(), 2);
    assert_eq!(world.destroy(origin), Err(WorldError::UnknownEntity(origin)));

    // The survivor keeps reacting without a sibling
    world.change_time(TimeState::L1);
    assert!(visible(&world, l1));
}

#[test]
fn stabilized_origin_half_shares_l1_with_its_sibling() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let (l1, origin) = twin_pair(&mut world);

    world.set_protected(origin, true).unwrap();

    assert!(visible(&world, l1));
    assert!(visible(&world, origin));
}

//--- Portals ---------------------------------------------------------------

#[test]
fn l1_half_walks_into_origin_and_back() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let (l1, origin) = twin_pair(&mut world);
    let spot = Pose::at(Vec3::new(3.0, 0.0, 0.0));
    world.move_entity(l1, spot).unwrap();
    world.fixed_update();

    assert!(world.request_object_time_travel(l1, TimeState::Origin).unwrap());

    assert_eq!(world.current_time(), TimeState::L1);
    assert_eq!(link(&world, l1).saved_origin_pose, Some(spot));
    assert_eq!(link(&world, l1).physical_timeline(), TimeState::Origin);
    assert!(link(&world, origin).suppressed_in_own_timeline);
    assert!(!broken(&world, l1));
    assert!(!visible(&world, l1));
    assert!(!visible(&world, origin));

    // Seen from Origin it stands in for its sibling
    world.change_time(TimeState::Origin);
    assert!(visible(&world, l1));
    assert!(!broken(&world, l1));
    assert!(!visible(&world, origin));
    world.change_time(TimeState::L1);

    assert!(world.request_object_time_travel(l1, TimeState::L1).unwrap());

    assert_eq!(link(&world, l1).saved_origin_pose, None);
    assert_eq!(link(&world, l1).physical_timeline(), TimeState::L1);
    assert!(!link(&world, origin).suppressed_in_own_timeline);
    assert!(visible(&world, l1));
    assert_eq!(world.entity(l1).map(|e| e.pose), Some(spot));
}

#[test]
fn protected_l1_half_keeps_protection_through_a_portal() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let (l1, _) = twin_pair(&mut world);
    world.set_protected(l1, true).unwrap();

    assert!(world.request_object_time_travel(l1, TimeState::Origin).unwrap());

    assert!(protected(&world, l1));
    assert!(!broken(&world, l1));
    assert_eq!(link(&world, l1).physical_timeline(), TimeState::L1);
    assert!(visible(&world, l1));
}

#[test]
fn origin_half_portal_to_l1_joins_its_sibling() {
    let mut world = world();
    let (l1, origin) = twin_pair(&mut world);
    let spot = Pose::at(Vec3::new(5.0, 0.0, 0.0));
    world.move_entity(l1, spot).unwrap();

    world.request_object_time_travel(l1, TimeState::Origin).unwrap();
    assert!(link(&world, origin).suppressed_in_own_timeline);
    assert_eq!(link(&world, l1).saved_origin_pose, Some(spot));

    world.move_entity(origin, Pose::at(Vec3::new(7.0, 0.0, 0.0))).unwrap();
    assert!(world.request_object_time_travel(origin, TimeState::L1).unwrap());

    assert_eq!(world.entity(origin).map(|e| e.pose), Some(spot));
    assert!(!link(&world, origin).suppressed_in_own_timeline);
    assert_eq!(link(&world, l1).saved_origin_pose, None);
    assert!(visible(&world, origin));
    assert!(!visible(&world, l1));
}

#[test]
fn suppressed_origin_half_portal_home_lifts_suppression() {
    let mut world = world();
    let (l1, origin) = twin_pair(&mut world);
    world.request_object_time_travel(l1, TimeState::Origin).unwrap();
    assert!(!visible(&world, origin));

    assert!(world.request_object_time_travel(origin, TimeState::Origin).unwrap());

    assert!(!link(&world, origin).suppressed_in_own_timeline);
    assert!(link(&world, l1).saved_origin_pose.is_some());
    assert!(visible(&world, origin));
}

#[test]
fn zero_delay_allows_a_portal_trip_right_after_a_toggle() {
    let mut world = world();
    let vase = world.spawn(EntityBuilder::new("vase").timeline_object());

    world.change_time(TimeState::L1);

    assert!(!world.is_cooling_down());
    assert!(world.request_object_time_travel(vase, TimeState::Origin).unwrap());
}

#[derive(Debug, Clone, Copy)]
enum TwinOp {
    Toggle,
    ProtectL1(bool),
    ProtectOrigin(bool),
}

fn twin_op() -> impl Strategy<Value = TwinOp> {
    prop_oneof![
        Just(TwinOp::Toggle),
        any::<bool>().prop_map(TwinOp::ProtectL1),
        any::<bool>().prop_map(TwinOp::ProtectOrigin),
    ]
}

proptest! {
    #[test]
    fn visibility_table_holds_when_settled(ops in prop::collection::vec(twin_op(), 1..24)) {
        let mut world = world();
        let (l1, origin) = twin_pair(&mut world);

        for op in ops {
            match op {
                TwinOp::Toggle => world.change_time(world.current_time().toggled()),
                TwinOp::ProtectL1(on) => {
                    world.set_protected(l1, on).unwrap();
                }
                TwinOp::ProtectOrigin(on) => {
                    world.set_protected(origin, on).unwrap();
                }
            }
            world.fixed_update();

            let expected = match world.current_time() {
                TimeState::Origin => (false, true),
                TimeState::L1 => (true, protected(&world, origin)),
            };
            prop_assert_eq!((visible(&world, l1), visible(&world, origin)), expected);
        }
    }

    #[test]
    fn unprotected_objects_break_in_origin_and_mend_in_l1(
        steps in prop::collection::vec((any::<bool>(), any::<bool>()), 1..16)
    ) {
        let mut world = world();
        let statue = world.spawn(EntityBuilder::new("statue").timeline_object());

        for (shield, to_origin) in steps {
            world.set_protected(statue, shield).unwrap();
            let target = if to_origin { TimeState::Origin } else { TimeState::L1 };
            world.change_time(target);

            let expect_broken = target == TimeState::Origin && !protected(&world, statue);
            prop_assert_eq!(broken(&world, statue), expect_broken);
        }
    }
}

//=== Power Graph =========================================================

#[test]
fn phase_cycle_restores_door_protection() {
    let mut world = world();
    let switch = world.spawn(EntityBuilder::new("dial").switch(RotateEnergy::new(7)));
    let gate = world.spawn(EntityBuilder::new("gate").door(TimeDoor::new(7, 0, false)));
    assert!(!protected(&world, gate));

    world.interact(switch).unwrap();
    let dial = world.entity(switch).and_then(|e| e.switch.as_ref()).unwrap();
    assert_eq!(dial.phase(), 0);

    world.set_powered(switch, true).unwrap();
    let original = protected(&world, gate);
    assert!(original);

    for turn in 1..=4 {
        world.interact(switch).unwrap();
        assert_eq!(protected(&world, gate), turn % 4 == 0);
    }
    assert_eq!(protected(&world, gate), original);

    let rotations = world
        .drain_effects()
        .visuals
        .into_iter()
        .filter(|fx| matches!(fx, VisualEffect::SwitchRotation { entity, .. } if *entity == switch))
        .count();
    assert_eq!(rotations, 4);
}

#[test]
fn wire_stays_lit_while_any_source_feeds_it() {
    let mut world = world();
    let a = world.spawn(EntityBuilder::new("a").switch(RotateEnergy::new(0)));
    let b = world.spawn(EntityBuilder::new("b").switch(RotateEnergy::new(0)));
    let wire = world.spawn(EntityBuilder::new("wire").wire());
    world.assign_wire_to_phase(a, wire, 0).unwrap();
    world.assign_wire_to_phase(b, wire, 0).unwrap();

    world.set_powered(a, true).unwrap();
    world.set_powered(b, true).unwrap();
    world.set_powered(b, false).unwrap();

    let w = world.entity(wire).and_then(|e| e.wire.as_ref()).unwrap();
    assert!(w.is_energized());
    assert_eq!(object(&world, wire).visuals().active(), Some(VisualBucket::OriginActive));

    world.set_powered(a, false).unwrap();
    assert!(!world.entity(wire).and_then(|e| e.wire.as_ref()).unwrap().is_energized());
    assert_eq!(object(&world, wire).visuals().active(), Some(VisualBucket::OriginBroken));
}

#[test]
fn wiring_validates_phase_and_components() {
    let mut world = world();
    let dial = world.spawn(EntityBuilder::new("dial").switch(RotateEnergy::new(0)));
    let lamp = world.spawn(EntityBuilder::new("lamp").timeline_object());

    assert_eq!(
        world.set_next_switch(dial, 4, None),
        Err(WorldError::InvalidPhase { phase: 4, max: 4 })
    );
    assert!(matches!(
        world.assign_wire_to_phase(dial, lamp, 0),
        Err(WorldError::MissingComponent { component: "wire", .. })
    ));
    assert!(matches!(
        world.interact(lamp),
        Err(WorldError::MissingComponent { component: "interactable", .. })
    ));
}

proptest! {
    #[test]
    fn switch_rings_terminate(size in 2usize..=6, start in 0usize..6, cycles in 1usize..4) {
        let mut world = world();
        let ring: Vec<EntityId> = (0..size)
            .map(|i| world.spawn(EntityBuilder::new(format!("s{i}")).switch(RotateEnergy::new(0))))
            .collect();
        for (i, id) in ring.iter().enumerate() {
            world.set_next_switch(*id, 0, Some(ring[(i + 1) % size])).unwrap();
        }
        let first = ring[start % size];

        for _ in 0..cycles {
            world.set_powered(first, true).unwrap();
            prop_assert!(ring.iter().all(|s| powered(&world, *s)));

            world.set_powered(first, false).unwrap();
            prop_assert!(ring.iter().all(|s| !powered(&world, *s)));
        }
    }

    #[test]
    fn door_protection_follows_dial_position(turns in 0usize..12) {
        let mut world = world();
        let gate = world.spawn(EntityBuilder::new("gate").door(TimeDoor::new(3, 0, false)));
        let dial = world.spawn(EntityBuilder::new("dial").switch(RotateEnergy::new(3)));
        world.set_powered(dial, true).unwrap();

        for _ in 0..turns {
            world.interact(dial).unwrap();
        }
        prop_assert_eq!(protected(&world, gate), turns % 4 == 0);
    }
}

//=== Holders & Shields ===================================================

struct Panel {
    holder: EntityId,
    shield: EntityId,
    zone: EntityId,
}

fn panel(world: &mut World) -> Panel {
    let holder = world.spawn(
        EntityBuilder::new("holder").holder(HolderShield::new(0, Pose::at(Vec3::new(5.0, 1.0, 0.0)))),
    );
    let zone = world.spawn(EntityBuilder::new("bubble").zone());
    let shield = world.spawn(EntityBuilder::new("shield").shield(ShieldItem::new(Some(zone))));
    Panel { holder, shield, zone }
}

#[test]
fn time_travel_disconnect_blocks_reinsert_until_cooldown() {
    let mut world = world();
    let p = panel(&mut world);

    // Plugged in Origin only: the L1 shield never was in the socket
    assert!(world.attach_shield(p.shield, p.holder).unwrap());
    world.change_time(TimeState::L1);

    let holder = world.entity(p.holder).and_then(|e| e.holder.as_ref()).unwrap();
    assert!(!holder.has_shield());
    assert!(holder.is_cooling_down());
    assert!(world.drain_effects().audio.contains(&AudioCue::ShieldTimeDisconnect { holder: p.holder }));

    assert!(!world.attach_shield(p.shield, p.holder).unwrap());
    run_for(&mut world, 1.0);
    assert!(world.attach_shield(p.shield, p.holder).unwrap());
}

#[test]
fn manual_detach_needs_reattach_cooldown() {
    let mut world = world();
    let p = panel(&mut world);
    assert!(world.attach_shield(p.shield, p.holder).unwrap());
    run_for(&mut world, 0.5);

    world.grab(p.shield).unwrap();
    let item = world.entity(p.shield).and_then(|e| e.shield.as_ref()).unwrap();
    assert!(!item.is_in_panel());
    assert!(!item.is_ready_to_attach());

    assert!(!world.attach_shield(p.shield, p.holder).unwrap());
    run_for(&mut world, 1.5);
    assert!(world.attach_shield(p.shield, p.holder).unwrap());
    assert!(!world.entity(p.shield).unwrap().is_held());
}

#[test]
fn plugging_the_shield_collapses_its_zone() {
    let mut world = world();
    let p = panel(&mut world);
    let vase = world.spawn(EntityBuilder::new("vase").timeline_object());

    world.zone_enter(p.zone, vase).unwrap();
    assert!(protected(&world, vase));

    world.attach_shield(p.shield, p.holder).unwrap();
    assert!(!protected(&world, vase));
    assert!(broken(&world, vase));
    assert!(!world.entity(p.zone).unwrap().active);

    // Inactive zones ignore visitors
    world.zone_enter(p.zone, vase).unwrap();
    assert!(!protected(&world, vase));
}

#[test]
fn holder_protects_door_in_its_system() {
    let mut world = world();
    let gate = world.spawn(EntityBuilder::new("gate").door(TimeDoor::new(9, 0, false)));
    let holder = world.spawn(
        EntityBuilder::new("holder").holder(HolderShield::new(9, Pose::at(Vec3::new(0.0, 1.0, 0.0)))),
    );
    let shield = world.spawn(EntityBuilder::new("shield").shield(ShieldItem::new(None)));

    assert!(!world.can_door_be_opened(gate).unwrap());
    world.attach_shield(shield, holder).unwrap();
    assert!(protected(&world, gate));
    assert!(world.can_door_be_opened(gate).unwrap());
}

//=== Chargers & Batteries ================================================

const SOCKET: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Spawns a charger and a loose battery at (3, 0, 0).
fn charger_and_battery(world: &mut World, settings: ObjectSettings) -> (EntityId, EntityId) {
    let charger = world.spawn(EntityBuilder::new("charger").charger(TimeCharger::new(Pose::at(SOCKET))));
    let battery = world.spawn(
        EntityBuilder::new("battery")
            .at(Pose::at(Vec3::new(3.0, 0.0, 0.0)))
            .object(settings)
            .battery(TimeBattery::new()),
    );
    (charger, battery)
}

fn charger(world: &World, id: EntityId) -> &TimeCharger {
    world.entity(id).and_then(|e| e.charger.as_ref()).expect("charger")
}

fn battery(world: &World, id: EntityId) -> &TimeBattery {
    world.entity(id).and_then(|e| e.battery.as_ref()).expect("battery")
}

#[test]
fn charger_fills_an_intact_battery() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let (charger_id, battery_id) = charger_and_battery(&mut world, ObjectSettings::default());
    world.drain_effects();

    assert!(world.insert_battery(charger_id, battery_id).unwrap());
    assert_eq!(world.entity(battery_id).map(|e| e.pose), Some(Pose::at(SOCKET)));
    assert!(charger(&world, charger_id).is_charging());
    assert!(world
        .drain_effects()
        .visuals
        .contains(&VisualEffect::ChargerLight { entity: charger_id, ready: true }));

    run_for(&mut world, 2.5);
    assert!(!battery(&world, battery_id).is_charged());

    run_for(&mut world, 0.6);
    assert!(battery(&world, battery_id).is_charged());
    assert!(world.is_battery_functional(battery_id).unwrap());
    assert!(world.describe(charger_id).unwrap().contains("currently charging a battery"));
    assert!(world.describe(battery_id).unwrap().ends_with("fully charged and ready to use."));
}

#[test]
fn grabbing_a_battery_empties_the_charger_until_cooldown() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let (charger_id, battery_id) = charger_and_battery(&mut world, ObjectSettings::default());
    world.insert_battery(charger_id, battery_id).unwrap();
    run_for(&mut world, 1.0);

    assert!(world.grab(battery_id).unwrap());

    assert_eq!(charger(&world, charger_id).battery(), None);
    assert!(charger(&world, charger_id).is_cooling_down());
    assert!(object(&world, battery_id).settings().use_position_saving);
    assert!(!world.insert_battery(charger_id, battery_id).unwrap());

    run_for(&mut world, 1.5);
    assert!(!battery(&world, battery_id).is_charged());
    assert!(world.insert_battery(charger_id, battery_id).unwrap());
    assert!(!world.entity(battery_id).unwrap().is_held());
    assert!(!object(&world, battery_id).settings().use_position_saving);
}

#[test]
fn broken_battery_sits_in_a_broken_charger_uncharged() {
    let mut world = world();
    let (charger_id, battery_id) = charger_and_battery(&mut world, ObjectSettings::default());
    assert!(broken(&world, battery_id));

    assert!(world.insert_battery(charger_id, battery_id).unwrap());
    assert!(!charger(&world, charger_id).is_charging());

    run_for(&mut world, 3.5);
    assert!(!battery(&world, battery_id).is_charged());
    assert!(world
        .describe(charger_id)
        .unwrap()
        .ends_with("It has a battery inserted but it's not charging because the charger is broken."));
}

#[test]
fn battery_inserted_in_l1_stays_across_crossings() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let (charger_id, battery_id) = charger_and_battery(&mut world, ObjectSettings::default());
    world.insert_battery(charger_id, battery_id).unwrap();

    world.change_time(TimeState::Origin);
    world.change_time(TimeState::L1);

    assert_eq!(charger(&world, charger_id).battery(), Some(battery_id));
    assert_eq!(world.entity(battery_id).map(|e| e.pose), Some(Pose::at(SOCKET)));
}

#[test]
fn battery_inserted_only_in_origin_falls_out_in_l1() {
    let mut world = world();
    let settings = ObjectSettings { start_protected: true, ..ObjectSettings::default() };
    let (charger_id, battery_id) = charger_and_battery(&mut world, settings);
    assert!(world.insert_battery(charger_id, battery_id).unwrap());
    assert!(charger(&world, charger_id).is_charging());

    world.change_time(TimeState::L1);

    assert_eq!(charger(&world, charger_id).battery(), None);
    assert!(charger(&world, charger_id).is_cooling_down());
    assert_eq!(battery(&world, battery_id).charger(), None);
    assert_eq!(world.entity(battery_id).map(|e| e.pose), Some(Pose::at(Vec3::new(3.0, 0.0, 0.0))));

    run_for(&mut world, 3.5);
    assert!(!battery(&world, battery_id).is_charged());
}

#[test]
fn origin_battery_half_drains_unless_protected() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let plain = world.spawn(
        EntityBuilder::new("cell")
            .battery(TimeBattery::charged())
            .twin("cell", TimeState::Origin),
    );
    let settings = ObjectSettings { start_protected: true, ..ObjectSettings::default() };
    let shielded = world.spawn(
        EntityBuilder::new("shielded cell")
            .object(settings)
            .battery(TimeBattery::charged())
            .twin("shielded cell", TimeState::Origin),
    );

    world.change_time(TimeState::Origin);

    assert!(!battery(&world, plain).is_charged());
    assert!(battery(&world, shielded).is_charged());
    assert!(world.is_battery_functional(shielded).unwrap());
}

#[test]
fn destroying_a_charger_frees_its_battery() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let (charger_id, battery_id) = charger_and_battery(&mut world, ObjectSettings::default());
    world.insert_battery(charger_id, battery_id).unwrap();

    world.destroy(charger_id).unwrap();

    assert_eq!(battery(&world, battery_id).charger(), None);
    assert_eq!(world.pending_timers(), 0);
    assert!(matches!(
        world.insert_battery(charger_id, battery_id),
        Err(WorldError::UnknownEntity(id)) if id == charger_id
    ));
}

//=== Doors & Consoles ====================================================

#[test]
fn door_opens_after_delay_and_snaps() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let gate = world.spawn(EntityBuilder::new("gate").door(TimeDoor::new(0, 0, false)));
    world.drain_effects();

    assert!(world.open_door(gate).unwrap());
    assert!(!world.open_door(gate).unwrap());
    run_for(&mut world, 3.0);

    let d = door(&world, gate);
    assert!(d.is_open());
    assert!(d.last_l1_open());
    assert_eq!(d.offset(), d.slide_distance);
    assert_eq!(d.motion(), DoorMotion::Idle);
    assert!(world.drain_effects().audio.contains(&AudioCue::DoorOpening { door: gate }));
}

#[test]
fn crossing_mid_slide_snaps_to_remembered_state() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let gate = world.spawn(EntityBuilder::new("gate").door(TimeDoor::new(0, 0, true)));

    assert!(world.close_door(gate).unwrap());
    run_for(&mut world, 0.3);
    assert!(door(&world, gate).is_busy());

    world.change_time(TimeState::Origin);

    let d = door(&world, gate);
    assert_eq!(d.motion(), DoorMotion::Idle);
    assert!(d.is_open());
    assert_eq!(d.offset(), d.slide_distance);
}

#[test]
fn broken_door_refuses_in_origin() {
    let mut world = world();
    let gate = world.spawn(EntityBuilder::new("gate").door(TimeDoor::new(0, 0, false)));

    assert!(!world.open_door(gate).unwrap());
    world.set_protected(gate, true).unwrap();
    assert!(world.open_door(gate).unwrap());
}

#[test]
fn console_needs_a_card_to_open_its_door() {
    let mut world = world();
    world.change_time(TimeState::L1);
    let gate = world.spawn(EntityBuilder::new("gate").door(TimeDoor::new(0, 0, false)));
    let console =
        world.spawn(EntityBuilder::new("console").console(CardConsole::new(0, 0, Some(gate))));
    let card = world.spawn(EntityBuilder::new("card").timeline_object().pickable());
    let screen = |w: &World| w.entity(console).and_then(|e| e.console.as_ref()).unwrap().screen();
    assert_eq!(screen(&world), ConsoleScreen::OnNeed);

    world.interact(console).unwrap();
    assert_eq!(screen(&world), ConsoleScreen::Denied);
    run_for(&mut world, 1.0);
    assert_eq!(screen(&world), ConsoleScreen::OnNeed);

    world.grab(card).unwrap();
    assert!(world.insert_card(console, card).unwrap());
    assert!(!world.entity(card).unwrap().is_held());
    assert_eq!(screen(&world), ConsoleScreen::Ready);

    world.interact(console).unwrap();
    assert_eq!(screen(&world), ConsoleScreen::Open);
    assert!(matches!(door(&world, gate).motion(), DoorMotion::PreOpen { .. }));
}

//=== Focus & Popup =======================================================

#[test]
fn popup_hides_after_delay_on_unfocus() {
    let mut world = world();
    let settings = ObjectSettings { use_world_popup: true, ..ObjectSettings::default() };
    let book = world.spawn(EntityBuilder::new("book").object(settings));
    world.set_camera(Some(Vec3::new(0.0, 0.0, 1.0)));

    world.focus(book).unwrap();
    assert!(world.popup(book).unwrap().is_active());

    world.unfocus(book).unwrap();
    assert!(world.popup(book).unwrap().is_active());
    run_for(&mut world, 1.0);
    assert!(!world.popup(book).unwrap().is_active());
}

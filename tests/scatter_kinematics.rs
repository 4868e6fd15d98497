use hadsim::error::Result;
use hadsim::{
    collision_time, transverse_distance_sqr, Action, ActionState, Error, FourVector, ParticleData,
    ParticleType, Particles, ProcessBranch, ProcessKind, RandomSource, StringFragmentation,
    ThreeVector,
};
use std::sync::Arc;

fn proton() -> Result<ParticleType> {
    ParticleType::new(2212, 0.938, 0.0, 1, 1)
}

fn pion_plus() -> Result<ParticleType> {
    ParticleType::new(211, 0.138, 0.0, 1, 0)
}

fn pion_zero() -> Result<ParticleType> {
    ParticleType::new(111, 0.135, 0.0, 0, 0)
}

fn delta_plus_plus() -> Result<ParticleType> {
    ParticleType::new(2224, 1.232, 0.117, 2, 3)
}

fn on_shell(ptype: ParticleType, p: ThreeVector) -> ParticleData {
    let mut particle = ParticleData::new(ptype);
    particle.set_momentum(ptype.mass, p);
    particle
}

fn insert_pair(
    world: &mut Particles,
    a: ParticleData,
    b: ParticleData,
) -> (ParticleData, ParticleData) {
    let id_a = world.insert(a);
    let id_b = world.insert(b);
    (
        world.get(id_a).cloned().expect("just inserted"),
        world.get(id_b).cloned().expect("just inserted"),
    )
}

/// Elastic scattering keeps the species pair and the center-of-momentum
/// momentum magnitude; only the direction is redrawn.
#[test]
fn elastic_scattering_preserves_species_and_momentum_magnitude() -> Result<()> {
    let mut world = Particles::new();
    let (a, b) = insert_pair(
        &mut world,
        on_shell(proton()?, ThreeVector::new(0.0, 0.0, 0.4)),
        on_shell(proton()?, ThreeVector::new(0.0, 0.0, -0.4)),
    );

    let mut action = Action::scatter(a, b, 2.0)?;
    action.add_collision(ProcessBranch::new(
        vec![proton()?, proton()?],
        40.0,
        ProcessKind::Elastic,
    )?)?;
    let mut rng = RandomSource::from_seed(246);
    action.generate_final_state(&mut rng)?;

    let out = action.outgoing_particles();
    assert_eq!(out[0].ptype.pdg, 2212);
    assert_eq!(out[1].ptype.pdg, 2212);
    // The pair was built in its center-of-momentum frame, so the sampled
    // momenta must keep |p| = 0.4 exactly up to rounding.
    assert!(
        (out[0].momentum.threevec().abs() - 0.4).abs() <= 1e-9,
        "elastic |p| drifted to {}",
        out[0].momentum.threevec().abs()
    );
    assert!(
        (out[0].momentum.threevec() + out[1].momentum.threevec()).abs() <= 1e-9,
        "outgoing momenta must cancel in the center-of-momentum frame"
    );

    let mut id_process = 0;
    action.perform(&mut world, &mut id_process)?;
    assert_eq!(world.len(), 2);
    Ok(())
}

/// Resonance formation assigns the exact summed four-momentum, putting the
/// resonance mass at sqrt(s) by construction.
#[test]
fn resonance_formation_takes_the_exact_summed_momentum() -> Result<()> {
    let mut world = Particles::new();
    let (a, b) = insert_pair(
        &mut world,
        on_shell(proton()?, ThreeVector::new(0.0, 0.0, 0.6)),
        on_shell(pion_plus()?, ThreeVector::new(0.0, 0.0, 0.1)),
    );
    let total = a.momentum + b.momentum;

    let mut action = Action::scatter(a, b, 1.0)?;
    action.add_collision(ProcessBranch::new(
        vec![delta_plus_plus()?],
        20.0,
        ProcessKind::Resonance,
    )?)?;
    let mut rng = RandomSource::from_seed(99);
    action.generate_final_state(&mut rng)?;

    let out = action.outgoing_particles();
    assert_eq!(out.len(), 1);
    assert_eq!(
        out[0].momentum, total,
        "the resonance must carry the pair's four-momentum unchanged"
    );
    assert!(
        (out[0].effective_mass() - action.sqrt_s()).abs() <= 1e-12,
        "resonance mass {} is not sqrt(s) {}",
        out[0].effective_mass(),
        action.sqrt_s()
    );

    let mut id_process = 0;
    action.perform(&mut world, &mut id_process)?;
    assert_eq!(world.len(), 1, "2 -> 1 leaves a single particle behind");
    Ok(())
}

/// Below the resonance's minimum mass the formation channel is closed.
#[test]
fn resonance_formation_below_the_mass_window_is_infeasible() -> Result<()> {
    let slow_a = on_shell(proton()?, ThreeVector::new(0.0, 0.0, 0.6));
    let slow_b = on_shell(pion_plus()?, ThreeVector::new(0.0, 0.0, 0.1));
    // sqrt(s) of this pair is ~1.076 GeV; raise the window floor above it.
    let narrow_delta = delta_plus_plus()?.with_min_mass(1.1)?;

    let mut action = Action::scatter(slow_a, slow_b, 0.0)?;
    action.add_collision(ProcessBranch::new(
        vec![narrow_delta],
        20.0,
        ProcessKind::Resonance,
    )?)?;
    let mut rng = RandomSource::from_seed(98);
    let err = action.generate_final_state(&mut rng).unwrap_err();
    assert!(
        matches!(err, Error::InfeasibleKinematics(_)),
        "got {err:?}"
    );
    assert!(err.is_recoverable());
    assert_eq!(action.state(), ActionState::Proposed);
    Ok(())
}

/// A 2 -> 2 channel with an unstable product samples the product mass inside
/// its window and still balances four-momentum and charge after perform.
#[test]
fn two_to_two_conserves_with_a_sampled_resonance_mass() -> Result<()> {
    let mut world = Particles::new();
    let (a, b) = insert_pair(
        &mut world,
        on_shell(proton()?, ThreeVector::new(0.0, 0.0, 0.8)),
        on_shell(pion_plus()?, ThreeVector::new(0.0, 0.0, -0.8)),
    );
    let p_in = a.momentum + b.momentum;

    let mut action = Action::scatter(a, b, 0.5)?;
    action.add_collision(ProcessBranch::new(
        vec![delta_plus_plus()?, pion_zero()?],
        5.0,
        ProcessKind::TwoToTwo,
    )?)?;
    let mut rng = RandomSource::from_seed(604);
    action.generate_final_state(&mut rng)?;

    let mut id_process = 0;
    action.perform(&mut world, &mut id_process)?;

    let out = action.outgoing_particles();
    let sqrts = action.sqrt_s();
    let delta_mass = out[0].effective_mass();
    assert!(
        delta_mass >= delta_plus_plus()?.min_mass() && delta_mass <= sqrts - 0.135 + 1e-9,
        "sampled Delta mass {delta_mass} outside its window at sqrt(s) = {sqrts}"
    );

    let p_out = out
        .iter()
        .fold(FourVector::default(), |acc, p| acc + p.momentum);
    let diff = p_in - p_out;
    let tol = 1e-6 * p_in.x0.abs().max(1.0) + 1e-9;
    assert!(
        diff.x0.abs() <= tol && diff.x1.abs() <= tol && diff.x2.abs() <= tol && diff.x3.abs() <= tol,
        "four-momentum imbalance {diff:?} exceeds tolerance {tol}"
    );
    let charge: i32 = out.iter().map(|p| p.ptype.charge).sum();
    assert_eq!(charge, 2, "p pi+ carries charge two into the final state");
    Ok(())
}

/// Fragments come back from the backend in the pair frame; the action boosts
/// them, orders them by rising longitudinal momentum, and stamps the delayed
/// formation time and the zeroed cross-section scaling.
#[test]
fn string_fragments_are_ordered_and_stamped() -> Result<()> {
    // Emits two pions back to back along z, deliberately leading with the
    // positive-z one to exercise the reordering.
    struct PairFragmenter;
    impl StringFragmentation for PairFragmenter {
        fn fragment(
            &self,
            _a: &ParticleData,
            _b: &ParticleData,
            sqrt_s: f64,
            _rng: &mut RandomSource,
        ) -> Result<Vec<ParticleData>> {
            let pion = ParticleType::new(111, 0.135, 0.0, 0, 0)?;
            let pz = (0.25 * sqrt_s * sqrt_s - 0.135 * 0.135).sqrt();
            let mut lead = ParticleData::new(pion);
            lead.set_momentum(0.135, ThreeVector::new(0.0, 0.0, pz));
            let mut trail = ParticleData::new(pion);
            trail.set_momentum(0.135, ThreeVector::new(0.0, 0.0, -pz));
            Ok(vec![lead, trail])
        }
    }

    let scalar = ParticleType::new(100221, 0.5, 0.0, 0, 0)?;
    let mut world = Particles::new();
    let mut a = on_shell(scalar, ThreeVector::new(0.0, 0.0, 0.9));
    a.position = FourVector::new(0.0, 1.0, 0.0, 0.0);
    let mut b = on_shell(scalar, ThreeVector::new(0.0, 0.0, -0.9));
    b.position = FourVector::new(0.0, -1.0, 0.0, 0.0);
    let (a, b) = insert_pair(&mut world, a, b);
    let p_in = a.momentum + b.momentum;

    let mut action = Action::scatter(a, b, 3.0)?;
    action.set_string_fragmentation(Arc::new(PairFragmenter), 1.5)?;
    action.add_collision(ProcessBranch::new(
        vec![],
        7.0,
        ProcessKind::StringExcitation,
    )?)?;
    let mut rng = RandomSource::from_seed(321);
    action.generate_final_state(&mut rng)?;

    let out = action.outgoing_particles();
    assert_eq!(out.len(), 2);
    assert!(
        out[0].momentum.x3 < out[1].momentum.x3,
        "fragments must be ordered by rising pz, got {} then {}",
        out[0].momentum.x3,
        out[1].momentum.x3
    );
    for fragment in out {
        assert_eq!(
            fragment.position,
            FourVector::new(3.0, 0.0, 0.0, 0.0),
            "fragments start at the interaction point"
        );
        assert_eq!(fragment.formation_time, 3.0 + 1.5);
        assert_eq!(fragment.xsec_scaling_factor, 0.0);
    }

    let mut id_process = 0;
    action.perform(&mut world, &mut id_process)?;
    let p_out = action
        .outgoing_particles()
        .iter()
        .fold(FourVector::default(), |acc, p| acc + p.momentum);
    let diff = p_in - p_out;
    let tol = 1e-6 * p_in.x0.abs().max(1.0) + 1e-9;
    assert!(
        diff.x0.abs() <= tol && diff.x1.abs() <= tol && diff.x2.abs() <= tol && diff.x3.abs() <= tol,
        "four-momentum imbalance {diff:?} exceeds tolerance {tol}"
    );
    Ok(())
}

/// Two particles on parallel tracks never meet.
#[test]
fn parallel_momenta_never_collide() -> Result<()> {
    let meson = ParticleType::new(661, 0.123, 0.0, 0, 0)?;
    let mut a = on_shell(meson, ThreeVector::new(0.3, -0.1, 0.2));
    a.position = FourVector::new(1.0, 1.0, 1.0, 1.0);
    let mut b = on_shell(meson, ThreeVector::new(0.3, -0.1, 0.2));
    b.position = FourVector::new(2.0, 2.0, 2.0, 2.0);
    assert!(
        collision_time(&a, &b) < 0.0,
        "parallel tracks must report a negative collision time"
    );
    Ok(())
}

/// A head-on pair meets after gap / closing speed, symmetrically in the
/// argument order.
#[test]
fn head_on_pair_collides_at_the_expected_time() -> Result<()> {
    let meson = ParticleType::new(661, 0.123, 0.0, 0, 0)?;
    let mut a = on_shell(meson, ThreeVector::new(0.3, 0.0, 0.0));
    a.position = FourVector::new(0.0, -1.0, 0.0, 0.0);
    let mut b = on_shell(meson, ThreeVector::new(-0.3, 0.0, 0.0));
    b.position = FourVector::new(0.0, 1.0, 0.0, 0.0);

    let time = collision_time(&a, &b);
    let energy = (0.123_f64 * 0.123 + 0.09).sqrt();
    let expected = 2.0 / (2.0 * 0.3 / energy);
    assert!(
        (time - expected).abs() <= 1e-12,
        "collision time {time}, expected {expected}"
    );
    assert_eq!(
        collision_time(&a, &b).to_bits(),
        collision_time(&b, &a).to_bits(),
        "collision time must not depend on the argument order"
    );
    Ok(())
}

/// For a resting pair the transverse distance reduces to plain geometry.
#[test]
fn resting_pair_distance_is_plain_geometry() -> Result<()> {
    let meson = ParticleType::new(661, 0.123, 0.0, 0, 0)?;
    let mut a = on_shell(meson, ThreeVector::default());
    a.position = FourVector::new(1.0, 1.0, 1.0, 1.0);
    let mut b = on_shell(meson, ThreeVector::default());
    b.position = FourVector::new(2.0, 2.0, 2.0, 2.0);

    let d_sqr = transverse_distance_sqr(&a, &b);
    assert!(
        (d_sqr - 3.0).abs() <= 1e-12,
        "resting pair distance^2 {d_sqr}, expected 3"
    );
    Ok(())
}

/// For a head-on pair the transverse distance recovers the impact parameter.
#[test]
fn transverse_distance_recovers_the_impact_parameter() -> Result<()> {
    let mut a = on_shell(proton()?, ThreeVector::new(0.0, 0.0, 1.0));
    a.position = FourVector::new(0.0, 0.5, 0.0, -5.0);
    let mut b = on_shell(proton()?, ThreeVector::new(0.0, 0.0, -1.0));
    b.position = FourVector::new(0.0, -0.5, 0.0, 5.0);

    let d_sqr = transverse_distance_sqr(&a, &b);
    assert!(
        (d_sqr - 1.0).abs() <= 1e-12,
        "impact parameter^2 {d_sqr}, expected 1"
    );
    Ok(())
}

/// The transverse distance stays finite and non-negative for fast, badly
/// aligned pairs.
#[test]
fn transverse_distance_stays_finite_for_fast_pairs() -> Result<()> {
    let meson = ParticleType::new(661, 0.123, 0.0, 0, 0)?;
    let mut a = on_shell(meson, ThreeVector::new(10.0, 9.0, 8.0));
    a.position = FourVector::new(1.0, 1.0, 1.0, 1.0);
    let mut b = on_shell(meson, ThreeVector::new(-10.0, -90.0, -80.0));
    b.position = FourVector::new(2.0, 2.0, 2.0, 2.0);

    let d_sqr = transverse_distance_sqr(&a, &b);
    assert!(d_sqr.is_finite(), "distance^2 must be finite, got {d_sqr}");
    assert!(d_sqr >= 0.0, "distance^2 must be non-negative, got {d_sqr}");
    Ok(())
}

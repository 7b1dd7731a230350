use super::*;
use crate::graph::Segment;
use crate::types::{DetectorAddress, Hit, HitId, SectorId, Side};
use nalgebra::Vector3;

fn hit(id: u32, layer: u32, p: [f64; 3]) -> Hit {
    Hit {
        id: HitId(id),
        position: Vector3::new(p[0], p[1], p[2]),
        address: DetectorAddress::new(Side::Forward, layer, 0, 0),
        sector: SectorId(layer),
        is_virtual: false,
    }
}

fn chain(points: &[[f64; 3]]) -> Vec<Hit> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| hit(i as u32, i as u32, *p))
        .collect()
}

/// Parent/child pair of `len`-hit segments over `len + 1` consecutive hits.
fn pair(points: &[[f64; 3]], len: usize) -> (Segment, Segment) {
    let hits = chain(points);
    assert_eq!(hits.len(), len + 1);
    (
        Segment::new(hits[..len].to_vec()),
        Segment::new(hits[1..].to_vec()),
    )
}

fn bent(deg: f64) -> [[f64; 3]; 3] {
    // a -> b along z, b -> c bent by `deg` in the xz plane
    let rad = deg.to_radians();
    [
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 10.0],
        [10.0 * rad.sin(), 0.0, 10.0 + 10.0 * rad.cos()],
    ]
}

#[test]
fn zero_degree_window_accepts_straight_chain_and_rejects_bend() {
    let criterion = Angle3d::new(Bounds::new(0.0, 0.0));
    let (parent, child) = pair(&[[0.0, 0.0, 0.0], [1.0, 1.0, 10.0], [2.0, 2.0, 20.0]], 2);
    assert!(criterion.evaluate(&parent, &child, None).unwrap());

    let (parent, child) = pair(&bent(10.0), 2);
    assert!(!criterion.evaluate(&parent, &child, None).unwrap());
}

#[test]
fn zero_degree_window_accepts_straight_chains_off_the_grid() {
    let criterion = Angle3d::new(Bounds::new(0.0, 0.0));
    for k in 1..200 {
        let s = 0.37 * k as f64;
        let d = [0.013 * s, -0.029 * s, 1.0];
        let points = [[0.0; 3], d.map(|v| v * 220.0), d.map(|v| v * 370.0)];
        let (parent, child) = pair(&points, 2);
        assert!(criterion.evaluate(&parent, &child, None).unwrap(), "k={k}");
    }
}

#[test]
fn angle_bounds_outside_half_turn_are_clamped() {
    let straight = Angle3d::new(Bounds::new(-5.0, 5.0));
    let (parent, child) = pair(&bent(0.0), 2);
    assert!(straight.evaluate(&parent, &child, None).unwrap());

    let wide = Angle3d::new(Bounds::new(0.0, 200.0));
    let (parent, child) = pair(&bent(170.0), 2);
    assert!(wide.evaluate(&parent, &child, None).unwrap());
}

#[test]
fn angle_window_is_monotonic_in_bend() {
    let criterion = Angle3d::new(Bounds::new(0.0, 10.0));
    for (deg, expected) in [(0.5, true), (5.0, true), (9.5, true), (10.5, false), (30.0, false), (170.0, false)] {
        let (parent, child) = pair(&bent(deg), 2);
        assert_eq!(criterion.evaluate(&parent, &child, None).unwrap(), expected, "{deg} degrees");
    }
}

#[test]
fn helix_from_the_ip_has_unit_phase_ratio() {
    let criterion = HelixWithIp::new(Bounds::new(0.9, 1.1));
    let on_helix = |z: f64| {
        let phi = 0.002 * z;
        [300.0 * phi.sin(), 300.0 * (1.0 - phi.cos()), z]
    };
    let (parent, child) = pair(&[on_helix(100.0), on_helix(250.0)], 1);
    let mut values = CriterionValues::new();
    assert!(criterion.evaluate(&parent, &child, Some(&mut values)).unwrap());
    assert!((values.get("helix_with_ip.ratio").unwrap() - 1.0).abs() < 1e-9);

    // Outer hit moved along z: turning rate no longer matches.
    let [x, y, _] = on_helix(250.0);
    let (parent, child) = pair(&[on_helix(100.0), [x, y, 350.0]], 1);
    assert!(!criterion.evaluate(&parent, &child, None).unwrap());
}

#[test]
fn helix_with_ip_passes_straight_tracks() {
    let criterion = HelixWithIp::new(Bounds::new(0.9, 1.1));
    let (parent, child) = pair(&[[10.0, 5.0, 100.0], [30.0, 15.0, 300.0]], 1);
    let mut values = CriterionValues::new();
    assert!(criterion.evaluate(&parent, &child, Some(&mut values)).unwrap());
    assert_eq!(values.get("helix_with_ip.ratio"), Some(1.0));
}

#[test]
fn delta_rho_verdict_follows_window() {
    let criterion = DeltaRho::new(Bounds::new(1.0, 5.0));
    for (rho_b, expected) in [(0.5, false), (2.0, true), (4.0, true), (6.5, false)] {
        let (parent, child) = pair(&[[1.0, 0.0, 10.0], [0.0, 1.0 + rho_b, 20.0]], 1);
        let mut values = CriterionValues::new();
        let verdict = criterion.evaluate(&parent, &child, Some(&mut values)).unwrap();
        assert_eq!(verdict, expected, "delta rho {rho_b}");
        assert!((values.get("delta_rho.mm").unwrap() - rho_b).abs() < 1e-12);
    }
}

#[test]
fn straight_track_ratio_is_one_on_ip_line() {
    let criterion = StraightTrackRatio::new(Bounds::new(0.99, 1.01));
    let (parent, child) = pair(&[[1.0, 2.0, 10.0], [3.0, 6.0, 30.0]], 1);
    let mut values = CriterionValues::new();
    assert!(criterion.evaluate(&parent, &child, Some(&mut values)).unwrap());
    assert!((values.get("straight_track_ratio.ratio").unwrap() - 1.0).abs() < 1e-12);

    let (parent, child) = pair(&[[1.0, 2.0, 10.0], [6.0, 12.0, 30.0]], 1);
    assert!(!criterion.evaluate(&parent, &child, None).unwrap());
}

#[test]
fn rz_ratio_passes_for_equal_z() {
    let criterion = RzRatio::new(Bounds::new(1.0, 1.2));
    let (parent, child) = pair(&[[0.0, 0.0, 10.0], [5.0, 0.0, 10.0]], 1);
    let mut values = CriterionValues::new();
    assert!(criterion.evaluate(&parent, &child, Some(&mut values)).unwrap());
    assert_eq!(values.get("rz_ratio.ratio"), Some(1.0));
}

#[test]
fn delta_phi_guards_hits_on_axis() {
    let criterion = DeltaPhi::new(Bounds::new(0.0, 1.0));
    let (parent, child) = pair(&[[0.0, 0.0, 0.0], [5.0, 5.0, 10.0]], 1);
    assert!(criterion.evaluate(&parent, &child, None).unwrap());

    let (parent, child) = pair(&[[5.0, 0.0, 10.0], [0.0, 5.0, 20.0]], 1);
    assert!(!criterion.evaluate(&parent, &child, None).unwrap());
}

#[test]
fn arity_mismatch_is_reported() {
    let criterion = Angle3d::new(Bounds::new(0.0, 10.0));
    let (parent, child) = pair(&[[0.0, 0.0, 0.0], [0.0, 0.0, 10.0]], 1);
    let err = criterion.evaluate(&parent, &child, None).unwrap_err();
    assert_eq!(
        err,
        CriterionError::ArityMismatch {
            criterion: CriterionKind::Angle3d,
            expected: 2,
            parent: 1,
            child: 1,
        }
    );
}

#[test]
fn collinear_hits_cannot_disprove_circle_criteria() {
    let (parent, child) = pair(&[[0.0, 0.0, 0.0], [1.0, 1.0, 10.0], [2.0, 2.0, 20.0]], 2);
    let pt = Pt::new(Bounds::new(1.0, 2.0), 3.5);
    let mut values = CriterionValues::new();
    assert!(pt.evaluate(&parent, &child, Some(&mut values)).unwrap());
    assert_eq!(values.get("pt.gev"), Some(0.0));

    let dist = IpCircleDist::new(Bounds::new(5.0, 6.0));
    assert!(dist.evaluate(&parent, &child, None).unwrap());
}

#[test]
fn coincident_hits_pass_angle_criteria() {
    let (parent, child) = pair(&[[1.0, 1.0, 10.0], [1.0, 1.0, 10.0], [3.0, -4.0, 20.0]], 2);
    let criterion = Angle2d::new(Bounds::new(0.0, 1.0));
    let mut values = CriterionValues::new();
    assert!(criterion.evaluate(&parent, &child, Some(&mut values)).unwrap());
    assert_eq!(values.get("angle_2d.degrees"), Some(0.0));
}

#[test]
fn pt_from_circle_radius() {
    // Three points on a circle of radius 1000 mm centred at (1000, 0).
    let on_circle = |phi: f64| [1000.0 + 1000.0 * phi.cos(), 1000.0 * phi.sin(), 0.0];
    let mut points = [on_circle(3.0), on_circle(2.9), on_circle(2.8)];
    for (i, p) in points.iter_mut().enumerate() {
        p[2] = 100.0 * (i + 1) as f64;
    }
    let (parent, child) = pair(&points, 2);
    let mut values = CriterionValues::new();
    let pt = Pt::new(Bounds::new(1.0, 1.1), 3.5);
    assert!(pt.evaluate(&parent, &child, Some(&mut values)).unwrap());
    assert!((values.get("pt.gev").unwrap() - 1.05).abs() < 1e-6);
    assert!(!Pt::new(Bounds::new(2.0, 3.0), 3.5)
        .evaluate(&parent, &child, None)
        .unwrap());
}

#[test]
fn zig_zag_gives_negative_product() {
    let criterion = NoZigZag::new(Bounds::new(0.0, 1.0e6));
    let smooth = [[0.0, 0.0, 0.0], [10.0, 1.0, 10.0], [20.0, 4.0, 20.0], [30.0, 9.0, 30.0]];
    let (parent, child) = pair(&smooth, 3);
    assert!(criterion.evaluate(&parent, &child, None).unwrap());

    let zig = [[0.0, 0.0, 0.0], [10.0, 1.0, 10.0], [20.0, 4.0, 20.0], [30.0, 5.0, 30.0]];
    let (parent, child) = pair(&zig, 3);
    let mut values = CriterionValues::new();
    assert!(!criterion.evaluate(&parent, &child, Some(&mut values)).unwrap());
    assert!(values.get("no_zig_zag.product").unwrap() < 0.0);
}

#[test]
fn straight_line_extrapolates_exactly() {
    let criterion = DistToExtrapolation::new(Bounds::new(0.0, 1e-6));
    let line = [[0.0, 0.0, 0.0], [1.0, 2.0, 10.0], [2.0, 4.0, 20.0], [3.0, 6.0, 30.0]];
    let (parent, child) = pair(&line, 3);
    assert!(criterion.evaluate(&parent, &child, None).unwrap());

    let kinked = [[0.0, 0.0, 0.0], [1.0, 2.0, 10.0], [2.0, 4.0, 20.0], [3.0, 9.0, 30.0]];
    let (parent, child) = pair(&kinked, 3);
    assert!(!criterion.evaluate(&parent, &child, None).unwrap());
}

#[test]
fn instrumentation_never_changes_verdict() {
    let mut config = CriteriaConfig::none();
    for kind in CriterionKind::ALL {
        config = config.with(kind, 0.0, 1.5);
    }
    let criteria = config.build(&CriterionContext::default()).unwrap();
    assert_eq!(criteria.len(), CriterionKind::ALL.len());

    let helix = |i: usize| {
        let phi = 0.3 * i as f64;
        [300.0 * phi.sin(), 300.0 * (1.0 - phi.cos()), 50.0 * i as f64 + 10.0]
    };
    let points: Vec<[f64; 3]> = (0..4).map(helix).collect();
    for len in 1..=3 {
        let (parent, child) = pair(&points[..=len], len);
        for criterion in criteria.for_segment_len(len) {
            let plain = criterion.evaluate(&parent, &child, None).unwrap();
            let mut values = CriterionValues::new();
            let recorded = criterion.evaluate(&parent, &child, Some(&mut values)).unwrap();
            assert_eq!(plain, recorded, "{}", criterion.kind());
            assert!(!values.is_empty(), "{} recorded nothing", criterion.kind());
            assert!(values.iter().all(|(key, _)| key.starts_with(criterion.kind().name())));
        }
    }
}

#[test]
fn for_segment_len_partitions_criteria() {
    let mut config = CriteriaConfig::none();
    for kind in CriterionKind::ALL {
        config = config.with(kind, 0.0, 1.0);
    }
    let criteria = config.build(&CriterionContext::default()).unwrap();
    let counts: Vec<usize> = (1..=3).map(|n| criteria.for_segment_len(n).len()).collect();
    assert_eq!(counts, vec![5, 5, 7]);
    assert!(criteria.for_segment_len(4).is_empty());
}

#[test]
fn are_compatible_requires_every_criterion() {
    let criteria = CriteriaConfig::none()
        .with(CriterionKind::Angle3d, 0.0, 10.0)
        .with(CriterionKind::ChangeRzRatio, 0.9, 1.1)
        .build(&CriterionContext::default())
        .unwrap();
    let active = criteria.for_segment_len(2);
    let (parent, child) = pair(&[[0.0, 0.0, 0.0], [1.0, 1.0, 10.0], [2.0, 2.0, 20.0]], 2);
    assert!(are_compatible(&active, &parent, &child).unwrap());

    let (parent, child) = pair(&bent(45.0), 2);
    assert!(!are_compatible(&active, &parent, &child).unwrap());

    let mut values = CriterionValues::new();
    assert!(!evaluate_all(&active, &parent, &child, &mut values).unwrap());
    assert!(values.get("angle_3d.degrees").is_some());
    assert!(values.get("change_rz_ratio.ratio").is_some());
}

#[test]
fn config_reports_missing_and_invalid_bounds() {
    let ctx = CriterionContext::default();
    let mut config = CriteriaConfig::none();
    config.enabled.push(CriterionKind::Pt);
    assert_eq!(
        config.build(&ctx).unwrap_err(),
        ConfigError::MissingBounds(CriterionKind::Pt)
    );

    let config = CriteriaConfig::none().with(CriterionKind::DeltaRho, 5.0, 1.0);
    assert!(matches!(
        config.build(&ctx).unwrap_err(),
        ConfigError::InvalidBounds { kind: CriterionKind::DeltaRho, .. }
    ));

    let mut config = CriteriaConfig::none();
    config.bounds.insert(CriterionKind::Pt, Bounds::new(1.0, 0.0));
    assert!(config.build(&ctx).unwrap().is_empty());
}

#[test]
fn config_parses_snake_case_names() {
    let json = r#"{
        "enabled": ["angle_3d", "dist_to_extrapolation"],
        "bounds": {
            "angle_3d": {"min": 0.0, "max": 5.0},
            "dist_to_extrapolation": {"min": 0.0, "max": 0.1}
        }
    }"#;
    let config: CriteriaConfig = serde_json::from_str(json).unwrap();
    let criteria = config.build(&CriterionContext::default()).unwrap();
    let kinds: Vec<CriterionKind> = criteria.iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, vec![CriterionKind::Angle3d, CriterionKind::DistToExtrapolation]);
}

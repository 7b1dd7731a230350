use super::{
    Angle2d, Angle2dChange, Angle3d, Angle3dChange, Bounds, ChangeRzRatio, Criterion,
    CriterionContext, DeltaPhi, DeltaRho, DistOfCircleCenters, DistToExtrapolation, HelixWithIp,
    IpCircleDist, NoZigZag, PhiZRatioChange, Pt, RChange, RzRatio, StraightTrackRatio,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry of the available criteria, used as configuration key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CriterionKind {
    #[serde(rename = "rz_ratio")]
    RzRatio,
    #[serde(rename = "straight_track_ratio")]
    StraightTrackRatio,
    #[serde(rename = "delta_phi")]
    DeltaPhi,
    #[serde(rename = "helix_with_ip")]
    HelixWithIp,
    #[serde(rename = "delta_rho")]
    DeltaRho,
    #[serde(rename = "angle_2d")]
    Angle2d,
    #[serde(rename = "angle_3d")]
    Angle3d,
    #[serde(rename = "change_rz_ratio")]
    ChangeRzRatio,
    #[serde(rename = "pt")]
    Pt,
    #[serde(rename = "ip_circle_dist")]
    IpCircleDist,
    #[serde(rename = "angle_2d_change")]
    Angle2dChange,
    #[serde(rename = "angle_3d_change")]
    Angle3dChange,
    #[serde(rename = "dist_of_circle_centers")]
    DistOfCircleCenters,
    #[serde(rename = "no_zig_zag")]
    NoZigZag,
    #[serde(rename = "r_change")]
    RChange,
    #[serde(rename = "phi_z_ratio_change")]
    PhiZRatioChange,
    #[serde(rename = "dist_to_extrapolation")]
    DistToExtrapolation,
}

impl CriterionKind {
    pub const ALL: [CriterionKind; 17] = [
        CriterionKind::RzRatio,
        CriterionKind::StraightTrackRatio,
        CriterionKind::DeltaPhi,
        CriterionKind::HelixWithIp,
        CriterionKind::DeltaRho,
        CriterionKind::Angle2d,
        CriterionKind::Angle3d,
        CriterionKind::ChangeRzRatio,
        CriterionKind::Pt,
        CriterionKind::IpCircleDist,
        CriterionKind::Angle2dChange,
        CriterionKind::Angle3dChange,
        CriterionKind::DistOfCircleCenters,
        CriterionKind::NoZigZag,
        CriterionKind::RChange,
        CriterionKind::PhiZRatioChange,
        CriterionKind::DistToExtrapolation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CriterionKind::RzRatio => "rz_ratio",
            CriterionKind::StraightTrackRatio => "straight_track_ratio",
            CriterionKind::DeltaPhi => "delta_phi",
            CriterionKind::HelixWithIp => "helix_with_ip",
            CriterionKind::DeltaRho => "delta_rho",
            CriterionKind::Angle2d => "angle_2d",
            CriterionKind::Angle3d => "angle_3d",
            CriterionKind::ChangeRzRatio => "change_rz_ratio",
            CriterionKind::Pt => "pt",
            CriterionKind::IpCircleDist => "ip_circle_dist",
            CriterionKind::Angle2dChange => "angle_2d_change",
            CriterionKind::Angle3dChange => "angle_3d_change",
            CriterionKind::DistOfCircleCenters => "dist_of_circle_centers",
            CriterionKind::NoZigZag => "no_zig_zag",
            CriterionKind::RChange => "r_change",
            CriterionKind::PhiZRatioChange => "phi_z_ratio_change",
            CriterionKind::DistToExtrapolation => "dist_to_extrapolation",
        }
    }

    /// Hits per compared segment.
    pub fn segment_len(self) -> usize {
        match self {
            CriterionKind::RzRatio
            | CriterionKind::StraightTrackRatio
            | CriterionKind::DeltaPhi
            | CriterionKind::HelixWithIp
            | CriterionKind::DeltaRho => 1,
            CriterionKind::Angle2d
            | CriterionKind::Angle3d
            | CriterionKind::ChangeRzRatio
            | CriterionKind::Pt
            | CriterionKind::IpCircleDist => 2,
            CriterionKind::Angle2dChange
            | CriterionKind::Angle3dChange
            | CriterionKind::DistOfCircleCenters
            | CriterionKind::NoZigZag
            | CriterionKind::RChange
            | CriterionKind::PhiZRatioChange
            | CriterionKind::DistToExtrapolation => 3,
        }
    }

    /// Distinct hits involved in one evaluation.
    pub fn hit_count(self) -> usize {
        self.segment_len() + 1
    }

    pub(crate) fn build(self, bounds: Bounds, ctx: &CriterionContext) -> Box<dyn Criterion> {
        match self {
            CriterionKind::RzRatio => Box::new(RzRatio::new(bounds)),
            CriterionKind::StraightTrackRatio => Box::new(StraightTrackRatio::new(bounds)),
            CriterionKind::DeltaPhi => Box::new(DeltaPhi::new(bounds)),
            CriterionKind::HelixWithIp => Box::new(HelixWithIp::new(bounds)),
            CriterionKind::DeltaRho => Box::new(DeltaRho::new(bounds)),
            CriterionKind::Angle2d => Box::new(Angle2d::new(bounds)),
            CriterionKind::Angle3d => Box::new(Angle3d::new(bounds)),
            CriterionKind::ChangeRzRatio => Box::new(ChangeRzRatio::new(bounds)),
            CriterionKind::Pt => Box::new(Pt::new(bounds, ctx.b_field_tesla)),
            CriterionKind::IpCircleDist => Box::new(IpCircleDist::new(bounds)),
            CriterionKind::Angle2dChange => Box::new(Angle2dChange::new(bounds)),
            CriterionKind::Angle3dChange => Box::new(Angle3dChange::new(bounds)),
            CriterionKind::DistOfCircleCenters => Box::new(DistOfCircleCenters::new(bounds)),
            CriterionKind::NoZigZag => Box::new(NoZigZag::new(bounds)),
            CriterionKind::RChange => Box::new(RChange::new(bounds)),
            CriterionKind::PhiZRatioChange => Box::new(PhiZRatioChange::new(bounds)),
            CriterionKind::DistToExtrapolation => Box::new(DistToExtrapolation::new(bounds)),
        }
    }
}

impl fmt::Display for CriterionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

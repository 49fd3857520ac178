//! Box regression target encoding.

use crate::common::*;

/// Regression deltas from an anchor to a ground truth box.
///
/// `dx` and `dy` are center offsets in units of the anchor extent. `dw` and
/// `dh` are the natural logs of the size ratios.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Target {
    pub dx: f32,
    pub dy: f32,
    pub dw: f32,
    pub dh: f32,
}

impl Target {
    pub fn encode<G, A>(gt: &G, anchor: &A) -> Self
    where
        G: Rect<Type = f32>,
        A: Rect<Type = f32>,
    {
        let aw = anchor.w();
        let ah = anchor.h();
        let gw = gt.w();
        let gh = gt.h();

        Self {
            dx: (gt.cx() - anchor.cx()) / aw,
            dy: (gt.cy() - anchor.cy()) / ah,
            dw: (gw / aw).ln(),
            dh: (gh / ah).ln(),
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.dx, self.dy, self.dw, self.dh]
    }
}

/// Encode the targets of paired ground truth boxes and anchors.
pub fn compute_targets<G, A>(gt: &[G], anchors: &[A]) -> Result<Vec<Target>>
where
    G: Rect<Type = f32>,
    A: Rect<Type = f32>,
{
    ensure!(
        gt.len() == anchors.len(),
        "expect equal number of ground truth boxes and anchors, but get {} and {}",
        gt.len(),
        anchors.len()
    );

    let targets = izip!(gt, anchors)
        .map(|(gt, anchor)| Target::encode(gt, anchor))
        .collect();
    Ok(targets)
}

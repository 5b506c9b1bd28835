use na::Vector3;
use ljmd_core::SystemParameters;

/// Wraps one displacement component into `[-box/2, box/2)` by removing the
/// nearest multiple of `box_length`.
pub fn pbc(x: f64, box_length: f64) -> f64 {
    x - box_length * (x / box_length + 0.5).floor()
}

/// Minimum image of a displacement in a cubic box.
pub fn minimum_image(d: Vector3<f64>, box_length: f64) -> Vector3<f64> {
    d.map(|x| pbc(x, box_length))
}

/// 12-6 Lennard-Jones pair potential with a plain cutoff.
///
/// The potential is not shifted, so energy jumps by `U(rcut)` when a pair
/// crosses the cutoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LennardJones {
    pub epsilon: f64,
    pub sigma: f64,
    pub r_cut: f64,
    c6: f64,
    c12: f64,
    rcsq: f64,
}

impl LennardJones {
    pub fn new(epsilon: f64, sigma: f64, r_cut: f64) -> Self {
        let sigma6 = sigma.powi(6);
        LennardJones {
            epsilon,
            sigma,
            r_cut,
            c6: 4.0 * epsilon * sigma6,
            c12: 4.0 * epsilon * sigma6 * sigma6,
            rcsq: r_cut * r_cut,
        }
    }

    pub fn from_parameters(params: &SystemParameters) -> Self {
        Self::new(params.epsilon, params.sigma, params.rcut)
    }

    /// For squared distance `rsq` returns `(ffac, u)`: the force on the first atom
    /// is `d * ffac` for displacement `d`, `u` is the pair energy. `None` at or
    /// beyond the cutoff.
    #[inline]
    pub fn pair(&self, rsq: f64) -> Option<(f64, f64)> {
        if rsq >= self.rcsq {
            return None;
        }
        let rinv = 1.0 / rsq;
        let r6 = rinv * rinv * rinv;
        let ffac = (12.0 * self.c12 * r6 - 6.0 * self.c6) * r6 * rinv;
        Some((ffac, r6 * (self.c12 * r6 - self.c6)))
    }

    /// Potential and force magnitude at distance `r`. Positive force is repulsive.
    pub fn get_potential_and_force(&self, r: f64) -> (f64, f64) {
        match self.pair(r * r) {
            Some((ffac, u)) => (u, ffac * r),
            None => (0.0, 0.0),
        }
    }
}

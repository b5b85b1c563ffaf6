use crate::{build_row, CalibrationError, EQUATIONS_PER_MEASUREMENT, UNKNOWNS};
use log::debug;
use nalgebra::{DMatrix, DVector};
use robcal_core::{MeasurementSet, Real};

/// Fewest measurements giving at least as many equations as unknowns.
pub const MIN_MEASUREMENTS: usize = UNKNOWNS / EQUATIONS_PER_MEASUREMENT;

/// Stacked `(12 m) x 24` system `A w = b`.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub a: DMatrix<Real>,
    pub b: DVector<Real>,
}

/// Stack the blocks of all measurements; block `i` occupies rows `12 i .. 12 i + 12`.
pub fn assemble(measurements: &MeasurementSet) -> Result<LinearSystem, CalibrationError> {
    let m = measurements.len();
    if m < MIN_MEASUREMENTS {
        return Err(CalibrationError::Underdetermined { measurements: m });
    }

    let rows = EQUATIONS_PER_MEASUREMENT * m;
    let mut a = DMatrix::<Real>::zeros(rows, UNKNOWNS);
    let mut b = DVector::<Real>::zeros(rows);

    for (i, meas) in measurements.iter().enumerate() {
        let (a_i, b_i) = build_row(&meas.robot_pose, &meas.marker_pose);
        let r0 = EQUATIONS_PER_MEASUREMENT * i;
        a.fixed_view_mut::<EQUATIONS_PER_MEASUREMENT, UNKNOWNS>(r0, 0)
            .copy_from(&a_i);
        b.fixed_rows_mut::<EQUATIONS_PER_MEASUREMENT>(r0)
            .copy_from(&b_i);
    }

    debug!("assembled {}x{} system from {} measurements", rows, UNKNOWNS, m);
    Ok(LinearSystem { a, b })
}

impl LinearSystem {
    pub fn measurements(&self) -> usize {
        self.a.nrows() / EQUATIONS_PER_MEASUREMENT
    }

    /// `A w - b`.
    pub fn residual(&self, w: &DVector<Real>) -> DVector<Real> {
        &self.a * w - &self.b
    }

    /// RMS of the residual over all equations.
    pub fn residual_rms(&self, w: &DVector<Real>) -> Real {
        let r = self.residual(w);
        if r.is_empty() {
            return 0.0;
        }
        (r.norm_squared() / r.len() as Real).sqrt()
    }

    /// RMS of the residual of each measurement's 12 equations.
    pub fn block_rms(&self, w: &DVector<Real>) -> Vec<Real> {
        let r = self.residual(w);
        r.as_slice()
            .chunks(EQUATIONS_PER_MEASUREMENT)
            .map(|c| {
                let ss: Real = c.iter().map(|v| v * v).sum();
                (ss / EQUATIONS_PER_MEASUREMENT as Real).sqrt()
            })
            .collect()
    }
}

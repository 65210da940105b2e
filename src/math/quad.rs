//! Adaptive Gauss–Kronrod quadrature.
//!
//! We integrate with the 15-point Kronrod rule and estimate the error from the
//! embedded 7-point Gauss rule. The interval with the largest error estimate is
//! bisected until the total estimate meets `max(epsabs, epsrel·|I|)` or the
//! subdivision limit is reached (the same contract as QUADPACK's `qag`).
//!
//! The integrands here (fitted lactation curves on `[1, L]`) are smooth, so a
//! handful of intervals is usually enough.

use thiserror::Error;

/// Quadrature tolerances.
#[derive(Debug, Clone)]
pub struct QuadOptions {
    pub epsabs: f64,
    pub epsrel: f64,
    /// Maximum number of subintervals.
    pub limit: usize,
}

impl Default for QuadOptions {
    fn default() -> Self {
        Self {
            epsabs: 1.49e-8,
            epsrel: 1.49e-8,
            limit: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadResult {
    pub value: f64,
    pub abs_error: f64,
    pub intervals: usize,
    /// `false` when the subdivision limit was hit before the tolerance was met.
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuadError {
    #[error("integration bounds must be finite (got [{lower}, {upper}])")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error("integrand is not finite at t={at}")]
    NonFinite { at: f64 },
}

// Kronrod abscissae on [0, 1]; odd indices are the Gauss nodes.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

#[derive(Debug, Clone, Copy)]
struct Segment {
    lower: f64,
    upper: f64,
    value: f64,
    error: f64,
}

/// Integrate `f` over `[lower, upper]`.
///
/// Reversed bounds flip the sign of the result.
pub fn integrate<F>(f: F, lower: f64, upper: f64, opts: &QuadOptions) -> Result<QuadResult, QuadError>
where
    F: Fn(f64) -> f64,
{
    if !(lower.is_finite() && upper.is_finite()) {
        return Err(QuadError::InvalidBounds { lower, upper });
    }
    if lower == upper {
        return Ok(QuadResult {
            value: 0.0,
            abs_error: 0.0,
            intervals: 0,
            converged: true,
        });
    }
    if upper < lower {
        let r = integrate(f, upper, lower, opts)?;
        return Ok(QuadResult { value: -r.value, ..r });
    }

    let limit = opts.limit.max(1);
    let mut segments = vec![kronrod15(&f, lower, upper)?];

    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let abs_error: f64 = segments.iter().map(|s| s.error).sum();
        let tolerance = opts.epsabs.max(opts.epsrel * value.abs());

        if abs_error <= tolerance || segments.len() >= limit {
            return Ok(QuadResult {
                value,
                abs_error,
                intervals: segments.len(),
                converged: abs_error <= tolerance,
            });
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.error.partial_cmp(&b.1.error).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let seg = segments.swap_remove(worst);
        let mid = 0.5 * (seg.lower + seg.upper);
        segments.push(kronrod15(&f, seg.lower, mid)?);
        segments.push(kronrod15(&f, mid, seg.upper)?);
    }
}

fn kronrod15<F>(f: &F, lower: f64, upper: f64) -> Result<Segment, QuadError>
where
    F: Fn(f64) -> f64,
{
    let center = 0.5 * (lower + upper);
    let half = 0.5 * (upper - lower);

    let eval = |t: f64| {
        let v = f(t);
        if v.is_finite() { Ok(v) } else { Err(QuadError::NonFinite { at: t }) }
    };

    let fc = eval(center)?;
    let mut kronrod = fc * WGK[7];
    let mut gauss = fc * WG[3];

    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = eval(center - dx)? + eval(center + dx)?;
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    Ok(Segment {
        lower,
        upper,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    })
}

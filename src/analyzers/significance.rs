//! Hypothesis tests used by the rating-pattern and diversity analyses.
//!
//! Special functions follow the usual numerical recipes: Chebyshev `erfc`,
//! Lanczos `ln_gamma`, a continued fraction for the regularized incomplete
//! beta function, and Acklam's rational approximation for normal quantiles.

use crate::analyzers::utility::{mean, sorted};
use crate::error::{Error, Result};

/// Complementary error function, fractional error below 1.2e-7.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.26551223
        + t * (1.00002368
            + t * (0.37409196
                + t * (0.09678418
                    + t * (-0.18628806
                        + t * (0.27886807
                            + t * (-1.13520398
                                + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277))))))));
    let r = t * poly.exp();
    if x >= 0.0 { r } else { 2.0 - r }
}

pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Upper tail of the standard normal distribution.
pub fn normal_sf(x: f64) -> f64 {
    0.5 * erfc(x / std::f64::consts::SQRT_2)
}

/// Inverse standard normal CDF (Acklam). `p` must lie in (0, 1).
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

pub fn ln_gamma(x: f64) -> f64 {
    const COF: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000000000190015;
    for c in COF {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.5066282746310005 * ser / x).ln()
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 3e-14;
    const FPMIN: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < FPMIN { FPMIN } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Regularized incomplete beta function I_x(a, b).
pub fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let front =
        (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Two-sided p-value of Student's t distribution.
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    incomplete_beta(df / 2.0, 0.5, df / (df + t * t))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub statistic: f64,
    pub p_value: f64,
    pub df: f64,
}

fn sample_variance(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Welch's unequal-variance two-sample t-test.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<TTest> {
    let got = a.len().min(b.len());
    if got < 2 {
        return Err(Error::InsufficientSample { needed: 2, got });
    }

    let (mean_a, mean_b) = (mean(a), mean(b));
    let va = sample_variance(a, mean_a) / a.len() as f64;
    let vb = sample_variance(b, mean_b) / b.len() as f64;
    let se2 = va + vb;
    if se2 == 0.0 {
        return Err(Error::PreconditionViolation(
            "both samples have zero variance".into(),
        ));
    }

    let statistic = (mean_a - mean_b) / se2.sqrt();
    let df = se2 * se2
        / (va * va / (a.len() - 1) as f64 + vb * vb / (b.len() - 1) as f64);

    Ok(TTest {
        statistic,
        p_value: student_t_two_sided(statistic, df),
        df,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Pearson product-moment correlation with a two-sided t-based p-value.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<Correlation> {
    if xs.len() != ys.len() {
        return Err(Error::PreconditionViolation(format!(
            "correlation inputs differ in length: {} vs {}",
            xs.len(),
            ys.len()
        )));
    }
    let n = xs.len();
    if n < 3 {
        return Err(Error::InsufficientSample { needed: 3, got: n });
    }

    let (mx, my) = (mean(xs), mean(ys));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return Err(Error::PreconditionViolation(
            "correlation input has zero variance".into(),
        ));
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let p_value = if r.abs() == 1.0 {
        0.0
    } else {
        let df = (n - 2) as f64;
        student_t_two_sided(r * (df / (1.0 - r * r)).sqrt(), df)
    };

    Ok(Correlation { r, p_value, n })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normality {
    pub statistic: f64,
    pub p_value: f64,
}

fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Shapiro-Wilk W test using Royston's (1995) approximation, valid for
/// 3 <= n <= 5000.
pub fn shapiro_wilk(values: &[f64]) -> Result<Normality> {
    const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
    const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
    const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
    const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
    const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
    const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];

    let n = values.len();
    if n < 3 {
        return Err(Error::InsufficientSample { needed: 3, got: n });
    }
    let x = sorted(values);
    if x[n - 1] - x[0] == 0.0 {
        return Err(Error::PreconditionViolation(
            "normality test input has zero range".into(),
        ));
    }

    let half = n / 2;
    let nf = n as f64;

    // Expected normal order statistics for the upper half, largest first.
    let m: Vec<f64> = (1..=half)
        .map(|i| -inverse_normal_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let mut a = vec![0.0; half];
    if n == 3 {
        a[0] = 0.5f64.sqrt();
    } else {
        let a1 = poly(&C1, rsn) + m[0] / ssumm2;
        let (fac, start) = if n > 5 {
            let a2 = m[1] / ssumm2 + poly(&C2, rsn);
            a[1] = a2;
            let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
                / (1.0 - 2.0 * a1.powi(2) - 2.0 * a2.powi(2)))
            .sqrt();
            (fac, 2)
        } else {
            let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a1.powi(2))).sqrt();
            (fac, 1)
        };
        a[0] = a1;
        for i in start..half {
            a[i] = m[i] / fac;
        }
    }

    let mean_x = mean(&x);
    let ss: f64 = x.iter().map(|v| (v - mean_x).powi(2)).sum();
    let numerator: f64 = (0..half).map(|i| a[i] * (x[n - 1 - i] - x[i])).sum();
    let w = (numerator * numerator / ss).min(1.0);

    if n == 3 {
        let p = 1.90985931710274 * (w.sqrt().asin() - 1.04719755119660);
        return Ok(Normality {
            statistic: w,
            p_value: p.clamp(0.0, 1.0),
        });
    }
    if w >= 1.0 {
        return Ok(Normality {
            statistic: w,
            p_value: 1.0,
        });
    }

    let mut y = (1.0 - w).ln();
    let (mu, sigma) = if n <= 11 {
        let gamma = -2.273 + 0.459 * nf;
        if y >= gamma {
            return Ok(Normality {
                statistic: w,
                p_value: 1e-99,
            });
        }
        y = -(gamma - y).ln();
        (poly(&C3, nf), poly(&C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    Ok(Normality {
        statistic: w,
        p_value: normal_sf((y - mu) / sigma),
    })
}

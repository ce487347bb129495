//! Small descriptive statistics used by the analyses.
//!
//! Undefined statistics are `None`, never NaN.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// True when every value equals the first one.
// 常數序列 (如 0.1) 的浮點變異數不一定剛好為 0
pub fn is_constant(values: &[f64]) -> bool {
    values.split_first().map_or(true, |(first, rest)| {
        rest.iter().all(|v| v == first)
    })
}

fn sum_of_squares(values: &[f64], m: f64) -> f64 {
    if is_constant(values) {
        return 0.0;
    }
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// 樣本標準差 (n - 1)，少於兩筆時無定義
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    Some((sum_of_squares(values, m) / (values.len() - 1) as f64).sqrt())
}

/// 母體標準差 (n)
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some((sum_of_squares(values, m) / values.len() as f64).sqrt())
}

/// Pearson correlation coefficient.
///
/// Returns `None` for fewer than two pairs, mismatched lengths, or when either
/// series has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 || is_constant(xs) || is_constant(ys) {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    // 浮點誤差可能略超出 [-1, 1]
    Some(r.clamp(-1.0, 1.0))
}

/// Linear-interpolation percentile, `q` in [0, 100].
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Column-wise standardisation to zero mean and unit variance.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(samples: &[Vec<f64>]) -> Self {
        let width = samples.first().map(Vec::len).unwrap_or(0);
        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);

        for column in 0..width {
            let values: Vec<f64> = samples.iter().map(|row| row[column]).collect();
            means.push(mean(&values).unwrap_or(0.0));
            // 常數欄位只置中，不縮放
            let std = population_std(&values).unwrap_or(0.0);
            scales.push(if std > 0.0 { std } else { 1.0 });
        }

        Self { means, scales }
    }

    pub fn transform(&self, samples: &[Vec<f64>]) -> Vec<Vec<f64>> {
        samples
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(value, (m, s))| (value - m) / s)
                    .collect()
            })
            .collect()
    }

    pub fn fit_transform(samples: &[Vec<f64>]) -> Vec<Vec<f64>> {
        Self::fit(samples).transform(samples)
    }
}

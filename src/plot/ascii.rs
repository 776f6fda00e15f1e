//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed VIS2 points: `o`
//! - model curve: `-` line, sampled along the u axis at the dataset's
//!   mean wavelength and MJD (exact for circularly symmetric models,
//!   a guide for elongated ones)

use crate::data::{DataSet, Vis2Point};
use crate::model::Model;

/// Render squared visibility against spatial frequency (megacycles/rad,
/// i.e. baseline-over-wavelength in units of 1e6).
pub fn render_vis2_plot(data: &DataSet, model: &Model, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points: Vec<&Vis2Point> = data.vis2.iter().filter(|p| p.vis2.is_finite()).collect();
    let (f_min, f_max) = freq_range(&points).unwrap_or((0.0, 100.0));
    let curve = sample_curve(model, &points, f_min, f_max, width.max(2));

    let (y_min, y_max) = y_range(&points, &curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    draw_curve(&mut grid, &curve, f_min, f_max, y_min, y_max);

    for p in &points {
        let x = map_x(freq_mega(p), f_min, f_max, width);
        let y = map_y(p.vis2, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: B/lambda=[{f_min:.1}, {f_max:.1}] Mcyc/rad | VIS2=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn freq_mega(p: &Vis2Point) -> f64 {
    (p.u * p.u + p.v * p.v).sqrt() / 1e6
}

fn freq_range(points: &[&Vis2Point]) -> Option<(f64, f64)> {
    let mut min_f = f64::INFINITY;
    let mut max_f = f64::NEG_INFINITY;
    for p in points {
        let f = freq_mega(p);
        min_f = min_f.min(f);
        max_f = max_f.max(f);
    }
    if min_f.is_finite() && max_f.is_finite() && max_f > min_f {
        Some((min_f, max_f))
    } else {
        None
    }
}

/// Model VIS2 along the u axis, at the dataset's mean (wavelength, MJD).
fn sample_curve(
    model: &Model,
    points: &[&Vis2Point],
    f_min: f64,
    f_max: f64,
    n: usize,
) -> Vec<(f64, f64)> {
    let (wl, mjd) = if points.is_empty() {
        (2.2e-6, 60000.0)
    } else {
        (
            points.iter().map(|p| p.wl).sum::<f64>() / points.len() as f64,
            points.iter().map(|p| p.mjd).sum::<f64>() / points.len() as f64,
        )
    };
    let n = n.max(2);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let f = f_min + u * (f_max - f_min);
        let vis2 = model.vis(f * 1e6, 0.0, wl, mjd).norm_sqr();
        out.push((f, vis2));
    }
    out
}

fn y_range(points: &[&Vis2Point], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_y = min_y.min(p.vis2);
        max_y = max_y.max(p.vis2);
    }
    for &(_, y) in curve {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(f: f64, f_min: f64, f_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((f - f_min) / (f_max - f_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    f_min: f64,
    f_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(f, y) in curve {
        let x = map_x(f, f_min, f_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

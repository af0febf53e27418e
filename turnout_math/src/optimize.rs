//! Bounded Nelder-Mead simplex minimisation
//!
//! Derivative-free search used to estimate smoothing parameters. Box bounds
//! are enforced by projecting every trial point back into the feasible box;
//! use `f64::NEG_INFINITY` / `f64::INFINITY` for an unbounded coordinate.

use crate::{MathError, Result};
use std::cmp::Ordering;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Nelder-Mead settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMead {
    max_iterations: usize,
    f_tolerance: f64,
    x_tolerance: f64,
}

/// Outcome of a minimisation
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether a stopping tolerance was met before the iteration cap
    pub converged: bool,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            f_tolerance: 1e-10,
            x_tolerance: 1e-10,
        }
    }
}

impl NelderMead {
    /// Create a minimiser with the given iteration cap and tolerance.
    ///
    /// The search stops once the simplex diameter is within `tolerance`, or
    /// once the objective spread across the simplex is within `tolerance`
    /// (relative to the best value, with an absolute floor) and the diameter
    /// is within `sqrt(tolerance)`.
    pub fn new(max_iterations: usize, tolerance: f64) -> Result<Self> {
        if max_iterations == 0 {
            return Err(MathError::InvalidInput(
                "Max iterations must be greater than zero".to_string(),
            ));
        }
        if !(tolerance > 0.0 && tolerance.is_finite()) {
            return Err(MathError::InvalidInput(format!(
                "Tolerance must be a positive finite number, got {}",
                tolerance
            )));
        }

        Ok(Self {
            max_iterations,
            f_tolerance: tolerance,
            x_tolerance: tolerance,
        })
    }

    /// Get the iteration cap
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Minimise `objective` starting from `start`.
    ///
    /// `steps` gives the initial simplex edge along each coordinate and
    /// `bounds` the feasible interval per coordinate. NaN objective values are
    /// treated as `+inf`.
    pub fn minimize<F>(
        &self,
        objective: F,
        start: &[f64],
        steps: &[f64],
        bounds: &[(f64, f64)],
    ) -> Result<Minimum>
    where
        F: Fn(&[f64]) -> f64,
    {
        let dim = start.len();
        if dim == 0 {
            return Err(MathError::InvalidInput(
                "Cannot optimise over zero parameters".to_string(),
            ));
        }
        if steps.len() != dim || bounds.len() != dim {
            return Err(MathError::InvalidInput(format!(
                "Dimension mismatch: start has {}, steps {}, bounds {}",
                dim,
                steps.len(),
                bounds.len()
            )));
        }
        if start.iter().chain(steps).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Start point and steps must be finite".to_string(),
            ));
        }
        if bounds.iter().any(|&(lo, hi)| lo.is_nan() || hi.is_nan() || lo > hi) {
            return Err(MathError::InvalidInput(
                "Each bound must satisfy lower <= upper".to_string(),
            ));
        }

        let origin = project(start, bounds);
        let mut simplex = Vec::with_capacity(dim + 1);
        simplex.push(origin.clone());
        for i in 0..dim {
            let mut vertex = origin.clone();
            vertex[i] += steps[i];
            vertex = project(&vertex, bounds);
            // Stepping into a bound collapses the edge; go the other way instead
            if vertex[i] == origin[i] {
                vertex[i] -= steps[i];
                vertex = project(&vertex, bounds);
            }
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|x| evaluate(&objective, x)).collect();

        for iteration in 0..self.max_iterations {
            order(&mut simplex, &mut values);

            let best = values[0];
            let worst = values[dim];
            if self.has_converged(&simplex, best, worst) {
                return Ok(Minimum {
                    point: simplex.swap_remove(0),
                    value: best,
                    iterations: iteration,
                    converged: true,
                });
            }

            let center = centroid(&simplex[..dim]);
            let reflected = project(&along(&center, &simplex[dim], REFLECTION), bounds);
            let f_reflected = evaluate(&objective, &reflected);

            if f_reflected < best {
                let expanded = project(&along(&center, &simplex[dim], EXPANSION), bounds);
                let f_expanded = evaluate(&objective, &expanded);
                if f_expanded < f_reflected {
                    simplex[dim] = expanded;
                    values[dim] = f_expanded;
                } else {
                    simplex[dim] = reflected;
                    values[dim] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[dim - 1] {
                simplex[dim] = reflected;
                values[dim] = f_reflected;
                continue;
            }

            let (contracted, accept_below) = if f_reflected < worst {
                (
                    project(&along(&center, &simplex[dim], CONTRACTION), bounds),
                    f_reflected,
                )
            } else {
                (
                    project(&along(&center, &simplex[dim], -CONTRACTION), bounds),
                    worst,
                )
            };
            let f_contracted = evaluate(&objective, &contracted);
            if f_contracted < accept_below {
                simplex[dim] = contracted;
                values[dim] = f_contracted;
                continue;
            }

            // Shrink everything towards the best vertex
            let anchor = simplex[0].clone();
            for (vertex, value) in simplex.iter_mut().zip(values.iter_mut()).skip(1) {
                let shrunk: Vec<f64> = anchor
                    .iter()
                    .zip(vertex.iter())
                    .map(|(a, v)| a + SHRINK * (v - a))
                    .collect();
                *vertex = project(&shrunk, bounds);
                *value = evaluate(&objective, vertex);
            }
        }

        order(&mut simplex, &mut values);
        Ok(Minimum {
            point: simplex.swap_remove(0),
            value: values[0],
            iterations: self.max_iterations,
            converged: false,
        })
    }

    /// The simplex has collapsed, or its values agree and it is already
    /// small. Equal values alone are not enough: vertices can straddle the
    /// minimum at the same height.
    fn has_converged(&self, simplex: &[Vec<f64>], best: f64, worst: f64) -> bool {
        if !best.is_finite() {
            return false;
        }

        let x_spread = simplex[1..]
            .iter()
            .flat_map(|vertex| vertex.iter().zip(simplex[0].iter()).map(|(v, b)| (v - b).abs()))
            .fold(0.0, f64::max);
        if x_spread <= self.x_tolerance {
            return true;
        }

        let f_spread = worst - best;
        f_spread <= self.f_tolerance * (1.0 + best.abs()) && x_spread <= self.x_tolerance.sqrt()
    }
}

fn evaluate<F: Fn(&[f64]) -> f64>(objective: &F, x: &[f64]) -> f64 {
    let value = objective(x);
    if value.is_nan() {
        f64::INFINITY
    } else {
        value
    }
}

/// Sort vertices by objective value, best first
fn order(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut paired: Vec<(f64, Vec<f64>)> = values
        .drain(..)
        .zip(simplex.drain(..))
        .collect();
    paired.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    for (value, vertex) in paired {
        values.push(value);
        simplex.push(vertex);
    }
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let n = vertices.len() as f64;
    let dim = vertices[0].len();
    (0..dim)
        .map(|i| vertices.iter().map(|v| v[i]).sum::<f64>() / n)
        .collect()
}

/// `centroid + coefficient * (centroid - worst)`
fn along(centroid: &[f64], worst: &[f64], coefficient: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(worst)
        .map(|(c, w)| c + coefficient * (c - w))
        .collect()
}

fn project(point: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    point
        .iter()
        .zip(bounds)
        .map(|(&x, &(lo, hi))| x.clamp(lo, hi))
        .collect()
}

//! Circuit Simulation
//!
//! Minimal statevector simulator for the kernel circuit: Y rotations and
//! controlled-Z. Both gates are real-orthogonal, so amplitudes stay real
//! and are stored as `f64`. Basis index bit `q` is qubit `q`.

use crate::constants::DEFAULT_MAX_QUBITS;
use crate::error::SimulationError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    /// Rotation about Y by `theta` radians
    Ry { qubit: usize, theta: f64 },
    /// Controlled-Z (symmetric in its two qubits)
    Cz { a: usize, b: usize },
}

/// Fixed-width register with an ordered gate list
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    qubits: usize,
    gates: Vec<Gate>,
}

impl Circuit {
    pub fn new(qubits: usize) -> Self {
        Self {
            qubits,
            gates: Vec::new(),
        }
    }

    pub fn ry(&mut self, qubit: usize, theta: f64) -> &mut Self {
        self.gates.push(Gate::Ry { qubit, theta });
        self
    }

    pub fn cz(&mut self, a: usize, b: usize) -> &mut Self {
        self.gates.push(Gate::Cz { a, b });
        self
    }

    pub fn qubits(&self) -> usize {
        self.qubits
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }
}

/// Circuit simulation capability
pub trait CircuitSimulator {
    /// Run from |0…0⟩ and return the final amplitudes (length 2^qubits)
    fn simulate(&self, circuit: &Circuit) -> Result<Vec<f64>, SimulationError>;
}

/// Dense statevector simulator
#[derive(Debug, Clone, Copy)]
pub struct StatevectorSimulator {
    max_qubits: usize,
}

impl StatevectorSimulator {
    pub fn new(max_qubits: usize) -> Self {
        Self { max_qubits }
    }

    pub fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    fn check(&self, circuit: &Circuit) -> Result<(), SimulationError> {
        let qubits = circuit.qubits();
        if qubits == 0 {
            return Err(SimulationError::EmptyRegister);
        }
        if qubits > self.max_qubits {
            return Err(SimulationError::TooManyQubits {
                requested: qubits,
                limit: self.max_qubits,
            });
        }

        let in_range = |qubit: usize| {
            if qubit < qubits {
                Ok(())
            } else {
                Err(SimulationError::QubitOutOfRange { qubit, qubits })
            }
        };

        for gate in circuit.gates() {
            match *gate {
                Gate::Ry { qubit, theta } => {
                    in_range(qubit)?;
                    if !theta.is_finite() {
                        return Err(SimulationError::NonFiniteAngle { qubit });
                    }
                }
                Gate::Cz { a, b } => {
                    in_range(a)?;
                    in_range(b)?;
                    if a == b {
                        return Err(SimulationError::DuplicateQubit(a));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for StatevectorSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUBITS)
    }
}

impl CircuitSimulator for StatevectorSimulator {
    fn simulate(&self, circuit: &Circuit) -> Result<Vec<f64>, SimulationError> {
        self.check(circuit)?;

        let mut state = vec![0.0f64; 1usize << circuit.qubits()];
        state[0] = 1.0;

        for gate in circuit.gates() {
            match *gate {
                Gate::Ry { qubit, theta } => apply_ry(&mut state, qubit, theta),
                Gate::Cz { a, b } => apply_cz(&mut state, a, b),
            }
        }
        Ok(state)
    }
}

fn apply_ry(state: &mut [f64], qubit: usize, theta: f64) {
    let (s, c) = (theta / 2.0).sin_cos();
    let mask = 1usize << qubit;
    for i in 0..state.len() {
        if i & mask != 0 {
            continue;
        }
        let j = i | mask;
        let (a0, a1) = (state[i], state[j]);
        state[i] = c * a0 - s * a1;
        state[j] = s * a0 + c * a1;
    }
}

fn apply_cz(state: &mut [f64], a: usize, b: usize) {
    let mask = (1usize << a) | (1usize << b);
    for (i, amp) in state.iter_mut().enumerate() {
        if i & mask == mask {
            *amp = -*amp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_ry_pi_flips_qubit() {
        let mut circuit = Circuit::new(1);
        circuit.ry(0, PI);
        let state = StatevectorSimulator::default().simulate(&circuit).unwrap();
        assert!(state[0].abs() < 1e-12);
        assert!((state[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cz_phases_only_11() {
        let mut circuit = Circuit::new(2);
        circuit.ry(0, PI / 2.0).ry(1, PI / 2.0).cz(0, 1);
        let state = StatevectorSimulator::default().simulate(&circuit).unwrap();
        assert!((state[0] - 0.5).abs() < 1e-12);
        assert!((state[1] - 0.5).abs() < 1e-12);
        assert!((state[2] - 0.5).abs() < 1e-12);
        assert!((state[3] + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_state_stays_normalized() {
        let mut circuit = Circuit::new(3);
        circuit.ry(0, 0.7).ry(1, 2.1).ry(2, -1.3).cz(0, 1).cz(1, 2).cz(0, 2);
        let state = StatevectorSimulator::default().simulate(&circuit).unwrap();
        let norm: f64 = state.iter().map(|a| a * a).sum();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_invalid_circuits() {
        let sim = StatevectorSimulator::new(4);

        assert_eq!(sim.simulate(&Circuit::new(0)), Err(SimulationError::EmptyRegister));
        assert_eq!(
            sim.simulate(&Circuit::new(5)),
            Err(SimulationError::TooManyQubits { requested: 5, limit: 4 })
        );

        let mut out_of_range = Circuit::new(2);
        out_of_range.ry(2, 0.1);
        assert_eq!(
            sim.simulate(&out_of_range),
            Err(SimulationError::QubitOutOfRange { qubit: 2, qubits: 2 })
        );

        let mut nan = Circuit::new(2);
        nan.ry(1, f64::NAN);
        assert_eq!(sim.simulate(&nan), Err(SimulationError::NonFiniteAngle { qubit: 1 }));

        let mut same = Circuit::new(2);
        same.cz(1, 1);
        assert_eq!(sim.simulate(&same), Err(SimulationError::DuplicateQubit(1)));
    }
}

//! Multichannel delay line for latency-compensated bypass.
//!
//! When a unit reports latency `L` and is bypassed, the host still expects the
//! output to be aligned with what the processed signal would have been, so the
//! dry input is delayed by `L` samples. One ring buffer of `L` samples is kept
//! per channel and all rings share a single write position.
//!
//! While the unit is processing normally the line is still fed through
//! [`LatencyDelay::write_block`], so the first samples of a bypass period are
//! the tail of the most recent input rather than audio from an older one.

use crate::sample::Sample;

/// Fixed-latency delay line across several channels.
#[derive(Debug, Clone)]
pub struct LatencyDelay<S: Sample> {
    /// One ring per input channel, each `delay` samples long.
    rings: Vec<Vec<S>>,
    n_outputs: usize,
    delay: usize,
    write_pos: usize,
}

impl<S: Sample> LatencyDelay<S> {
    /// Create a delay line for `n_inputs` input and `n_outputs` output
    /// channels, initially with zero delay.
    pub fn new(n_inputs: usize, n_outputs: usize) -> Self {
        Self {
            rings: vec![Vec::new(); n_inputs],
            n_outputs,
            delay: 0,
            write_pos: 0,
        }
    }

    /// Current delay in samples.
    #[inline]
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Number of channels that pass through the line.
    #[inline]
    pub fn n_channels(&self) -> usize {
        self.rings.len().min(self.n_outputs)
    }

    /// Change the delay, discarding any buffered audio.
    ///
    /// Allocates. Call only between blocks.
    pub fn set_delay(&mut self, samples: usize) {
        for ring in &mut self.rings {
            ring.clear();
            ring.resize(samples, S::ZERO);
        }
        self.delay = samples;
        self.write_pos = 0;
    }

    /// Fill every ring with silence and rewind.
    pub fn reset(&mut self) {
        for ring in &mut self.rings {
            ring.fill(S::ZERO);
        }
        self.write_pos = 0;
    }

    /// Delay `n_frames` of each input channel into the matching output.
    ///
    /// Channels paired = min(inputs, outputs, rings). Output channels beyond
    /// that are zeroed. With zero delay the inputs are copied straight through.
    pub fn process_block(&mut self, inputs: &[&[S]], outputs: &mut [&mut [S]], n_frames: usize) {
        let paired = self.n_channels().min(inputs.len()).min(outputs.len());

        if self.delay == 0 {
            for (out, input) in outputs.iter_mut().zip(inputs.iter()).take(paired) {
                let n = n_frames.min(input.len()).min(out.len());
                out[..n].copy_from_slice(&input[..n]);
            }
        } else {
            // Every channel starts from the shared write position; the
            // position after the last channel becomes the new one.
            let mut next_pos = self.write_pos;
            for ((ring, out), input) in self
                .rings
                .iter_mut()
                .zip(outputs.iter_mut())
                .zip(inputs.iter())
                .take(paired)
            {
                let mut pos = self.write_pos;
                let n = n_frames.min(input.len()).min(out.len());
                for (o, &i) in out[..n].iter_mut().zip(&input[..n]) {
                    *o = ring[pos];
                    ring[pos] = i;
                    pos += 1;
                    if pos == self.delay {
                        pos = 0;
                    }
                }
                next_pos = pos;
            }
            self.write_pos = next_pos;
        }

        for out in outputs.iter_mut().skip(paired) {
            let n = n_frames.min(out.len());
            out[..n].fill(S::ZERO);
        }
    }

    /// Push `n_frames` of each input channel into the line without producing
    /// output.
    ///
    /// Advances the write position exactly as [`process_block`](Self::process_block)
    /// would. A no-op with zero delay.
    pub fn write_block(&mut self, inputs: &[&[S]], n_frames: usize) {
        if self.delay == 0 {
            return;
        }

        let paired = self.n_channels().min(inputs.len());
        let mut next_pos = self.write_pos;
        for (ring, input) in self.rings.iter_mut().zip(inputs.iter()).take(paired) {
            let mut pos = self.write_pos;
            for &i in &input[..n_frames.min(input.len())] {
                ring[pos] = i;
                pos += 1;
                if pos == self.delay {
                    pos = 0;
                }
            }
            next_pos = pos;
        }
        self.write_pos = next_pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(len: usize, at: usize) -> Vec<f64> {
        let mut v = vec![0.0; len];
        v[at] = 1.0;
        v
    }

    #[test]
    fn test_zero_delay_copies() {
        let mut line = LatencyDelay::<f32>::new(2, 2);
        let a = [1.0f32, 2.0, 3.0];
        let b = [4.0f32, 5.0, 6.0];
        let mut x = [0.0f32; 3];
        let mut y = [0.0f32; 3];
        line.process_block(&[&a[..], &b[..]], &mut [&mut x[..], &mut y[..]], 3);
        assert_eq!(x, a);
        assert_eq!(y, b);
    }

    #[test]
    fn test_impulse_is_delayed() {
        let mut line = LatencyDelay::<f64>::new(1, 1);
        line.set_delay(5);
        let input = impulse(16, 3);
        let mut out = vec![0.0; 16];
        line.process_block(&[&input[..]], &mut [&mut out[..]], 16);
        assert_eq!(out, impulse(16, 8));
    }

    #[test]
    fn test_delay_spans_blocks() {
        let mut line = LatencyDelay::<f64>::new(1, 1);
        line.set_delay(6);
        let first = impulse(4, 2);
        let silence = vec![0.0; 4];
        let mut out = vec![0.0; 4];

        line.process_block(&[&first[..]], &mut [&mut out[..]], 4);
        assert!(out.iter().all(|&s| s == 0.0));

        // 2 + 6 = 8, which is frame 0 of the third block.
        line.process_block(&[&silence[..]], &mut [&mut out[..]], 4);
        assert!(out.iter().all(|&s| s == 0.0));
        line.process_block(&[&silence[..]], &mut [&mut out[..]], 4);
        assert_eq!(out, impulse(4, 0));
    }

    #[test]
    fn test_surplus_outputs_zeroed() {
        let mut line = LatencyDelay::<f32>::new(1, 3);
        line.set_delay(2);
        let input = [1.0f32; 4];
        let mut a = [9.0f32; 4];
        let mut b = [9.0f32; 4];
        let mut c = [9.0f32; 4];
        line.process_block(&[&input[..]], &mut [&mut a[..], &mut b[..], &mut c[..]], 4);
        assert_eq!(a, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(b, [0.0; 4]);
        assert_eq!(c, [0.0; 4]);
    }

    #[test]
    fn test_set_delay_and_reset_clear_history() {
        let mut line = LatencyDelay::<f64>::new(1, 1);
        line.set_delay(3);
        let ones = vec![1.0; 3];
        let silence = vec![0.0; 3];
        let mut out = vec![0.0; 3];
        line.process_block(&[&ones[..]], &mut [&mut out[..]], 3);

        line.reset();
        line.process_block(&[&silence[..]], &mut [&mut out[..]], 3);
        assert_eq!(out, silence);

        line.process_block(&[&ones[..]], &mut [&mut out[..]], 3);
        line.set_delay(4);
        assert_eq!(line.delay(), 4);
        line.process_block(&[&silence[..]], &mut [&mut out[..]], 3);
        assert_eq!(out, silence);
    }

    #[test]
    fn test_write_block_keeps_line_current() {
        let mut line = LatencyDelay::<f64>::new(1, 1);
        line.set_delay(3);

        let old = vec![1.0; 4];
        let mut out = vec![0.0; 4];
        line.process_block(&[&old[..]], &mut [&mut out[..]], 4);

        // Newer audio written without output replaces what was buffered.
        let ramp = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        line.write_block(&[&ramp[..]], 6);

        let silence = vec![0.0; 4];
        line.process_block(&[&silence[..]], &mut [&mut out[..]], 4);
        assert_eq!(out, vec![4.0, 5.0, 6.0, 0.0]);
    }

    #[test]
    fn test_write_block_without_delay_is_noop() {
        let mut line = LatencyDelay::<f32>::new(1, 1);
        let input = [1.0f32; 4];
        line.write_block(&[&input[..]], 4);
        assert_eq!(line.delay(), 0);
    }
}

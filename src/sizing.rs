//! Partitioning of the fixed sample budget between the input and output buffers.

/// Input and output buffer capacities, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizes {
    /// Capacity of the input block.
    pub input: usize,
    /// Capacity of the output block.
    pub output: usize,
}

impl BufferSizes {
    /// The total sample budget the capacities were carved from.
    #[inline]
    pub fn total(&self) -> usize {
        self.input + self.output
    }
}

/// Splits `total_budget` samples between the input and output buffers in proportion to the
/// rate ratio, so that one full input block converts into roughly one full output block.
///
/// The output share is `output_rate * total_budget / (input_rate + output_rate)`, rounded half
/// up; the input gets the remainder. A budget too small for the ratio can leave one side empty.
pub fn size_buffers(input_rate: f64, output_rate: f64, total_budget: usize) -> BufferSizes {
    let share = output_rate * total_budget as f64 / (input_rate + output_rate);
    let output = ((share + 0.5) as usize).min(total_budget);
    let input = total_budget - output;

    if input == 0 || output == 0 {
        log::warn!(
            "Buffer budget of {total_budget} samples leaves an empty buffer (input {input}, output {output})"
        );
    }

    BufferSizes { input, output }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downsample_by_two() {
        let sizes = size_buffers(16_000.0, 8_000.0, 1024);
        assert_eq!(sizes, BufferSizes { input: 683, output: 341 });
    }

    #[test]
    fn test_equal_rates_split_evenly() {
        let sizes = size_buffers(44_100.0, 44_100.0, 1024);
        assert_eq!(sizes, BufferSizes { input: 512, output: 512 });
    }

    #[test]
    fn test_rounds_half_up() {
        // 1 * 3 / 2 = 1.5 rounds to 2.
        let sizes = size_buffers(1.0, 1.0, 3);
        assert_eq!(sizes, BufferSizes { input: 1, output: 2 });
    }

    #[test]
    fn test_capacities_sum_to_budget() {
        let rates = [1.0, 8_000.0, 11_025.0, 16_000.0, 22_050.0, 44_100.0, 48_000.0, 192_000.0];
        for &input_rate in &rates {
            for &output_rate in &rates {
                for budget in [1, 2, 7, 64, 1000, 1024, 65_536] {
                    let sizes = size_buffers(input_rate, output_rate, budget);
                    assert_eq!(sizes.total(), budget, "{input_rate} -> {output_rate} / {budget}");
                }
            }
        }
    }

    #[test]
    fn test_degenerate_budget() {
        let sizes = size_buffers(192_000.0, 8_000.0, 1);
        assert_eq!(sizes, BufferSizes { input: 1, output: 0 });
    }
}

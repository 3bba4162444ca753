use sample_engine::utils::comparison::{max_abs_diff, max_abs_diff_slice};
use sample_engine::{
    BufferTransforms, DataType, EngineError, FftEngine, FftMode, SampleBuffer, StftEngine,
    WindowType,
};

fn noise(len: usize, seed: u64) -> Vec<f64> {
    // Small LCG so the signals are reproducible without extra dependencies.
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        })
        .collect()
}

#[test]
fn real_round_trip_for_awkward_lengths() {
    for (dtype, tolerance) in [(DataType::Float64, 1e-9), (DataType::Float32, 1e-4)] {
        for len in [1usize, 2, 3, 64, 4095, 4096] {
            let signal = SampleBuffer::new(&noise(len, len as u64), &[len], dtype).unwrap();
            let mut forward = FftEngine::new(len, dtype, FftMode::RealForward).unwrap();
            let mut inverse = FftEngine::new(len, dtype, FftMode::RealInverse).unwrap();

            let spectrum = forward.process(&signal).unwrap();
            assert_eq!(spectrum.shape().unwrap(), &[len / 2 + 1]);
            assert_eq!(spectrum.dtype().unwrap(), dtype.complex());

            let restored = inverse.process(&spectrum).unwrap();
            assert_eq!(restored.dtype().unwrap(), dtype);
            let err = max_abs_diff(&signal, &restored).unwrap();
            assert!(err < tolerance, "len {len} {dtype}: error {err}");
        }
    }
}

#[test]
fn batches_match_single_lane_transforms() {
    let rows = [noise(48, 1), noise(48, 2), noise(48, 3)];
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let batch = SampleBuffer::new(&flat, &[3, 48], DataType::Float64).unwrap();
    let mut engine = FftEngine::new(48, DataType::Float64, FftMode::Forward).unwrap();

    let spectra = engine.process(&batch).unwrap();
    assert_eq!(spectra.shape().unwrap(), &[3, 48]);
    let batched = spectra.to_host_values().unwrap();

    for (i, row) in rows.iter().enumerate() {
        let single = SampleBuffer::new(row, &[48], DataType::Float64).unwrap();
        let lane = engine.process(&single).unwrap().to_host_values().unwrap();
        assert!(max_abs_diff_slice(&batched[i * 96..(i + 1) * 96], &lane) < 1e-12);
    }
}

#[test]
fn outputs_are_fresh_buffers() {
    let signal = SampleBuffer::new(&noise(32, 9), &[32], DataType::Float32).unwrap();
    let view = signal.slice(0, 0..32).unwrap();
    let spectrum = view.rfft().unwrap();
    assert!(spectrum.is_unique().unwrap());
    assert_ne!(spectrum.mem_address().unwrap(), signal.mem_address().unwrap());
}

#[test]
fn impulse_has_flat_spectrum() {
    let mut values = vec![0.0; 16];
    values[0] = 1.0;
    let impulse = SampleBuffer::new(&values, &[16], DataType::Float64).unwrap();
    let bins = impulse.rfft().unwrap().to_host_values().unwrap();
    for pair in bins.chunks_exact(2) {
        assert!((pair[0] - 1.0).abs() < 1e-12);
        assert!(pair[1].abs() < 1e-12);
    }
}

#[test]
fn transform_errors() {
    assert!(matches!(
        FftEngine::new(0, DataType::Float64, FftMode::Forward),
        Err(EngineError::InvalidLength(_))
    ));
    assert!(matches!(
        FftEngine::new(8, DataType::Complex32, FftMode::RealForward),
        Err(EngineError::UnsupportedDtype(_))
    ));

    let mut engine = FftEngine::new(8, DataType::Float32, FftMode::RealForward).unwrap();
    let short = SampleBuffer::new(&[0.0; 6], &[6], DataType::Float32).unwrap();
    assert!(matches!(
        engine.process(&short),
        Err(EngineError::SizeMismatch { expected: 8, actual: 6, .. })
    ));
    let wrong_kind = SampleBuffer::new(&[0.0; 8], &[8], DataType::Float64).unwrap();
    assert!(matches!(
        engine.process(&wrong_kind),
        Err(EngineError::DtypeMismatch { .. })
    ));
}

#[test]
fn stft_locates_a_tone() {
    let sample_rate = 8000.0;
    let values: Vec<f64> = (0..4096)
        .map(|n| (2.0 * std::f64::consts::PI * 1000.0 * n as f64 / sample_rate).sin())
        .collect();
    let signal = SampleBuffer::new(&values, &[4096], DataType::Float64).unwrap();
    let mut stft =
        StftEngine::with_window(256, 64, 256, WindowType::Hann, DataType::Float64, FftMode::RealForward)
            .unwrap();
    let frames = stft.process(&signal).unwrap();
    assert_eq!(frames.shape().unwrap(), &[61, 129]);

    // 1000 Hz at 8000 Hz with 256 points lands on bin 32.
    let values = frames.to_host_values().unwrap();
    for frame in values.chunks_exact(2 * 129) {
        let peak = frame
            .chunks_exact(2)
            .map(|c| c[0].hypot(c[1]))
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(bin, _)| bin)
            .unwrap();
        assert_eq!(peak, 32);
    }
}

use sample_engine::utils::comparison::{best_shift, max_abs_diff_slice};
use sample_engine::utils::generation::multi_tone;
use sample_engine::{
    DataType, EngineError, PolynomialDegree, Resampler, ResamplerType, SampleBuffer,
    SincInterpolationParameters,
};

fn sine(freq: f64, sample_rate: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| 0.5 * (2.0 * std::f64::consts::PI * freq * n as f64 / sample_rate).sin())
        .collect()
}

fn mono(values: &[f64], dtype: DataType) -> SampleBuffer {
    SampleBuffer::new(values, &[values.len()], dtype).unwrap()
}

fn sinc_parameters(sinc_len: usize) -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len,
        oversampling_factor: 128,
        ..Default::default()
    }
}

#[test]
fn identity_ratio_reproduces_input() {
    let signal = sine(440.0, 44100.0, 4096);
    let input = mono(&signal, DataType::Float64);

    let mut nearest = Resampler::new_fast(
        1.0,
        1.0,
        PolynomialDegree::Nearest,
        512,
        1,
        ResamplerType::FastFixedIn,
        DataType::Float64,
    )
    .unwrap();
    let exact = nearest.process_all(&input).unwrap().to_host_values().unwrap();
    assert_eq!(exact.len(), signal.len());
    let (shift, err) = best_shift(&signal, &exact, 256, 3584, 2);
    assert!(shift.abs() <= 1, "nearest shifted by {shift}");
    assert_eq!(err, 0.0);

    let mut sinc = Resampler::new_sinc(
        1.0,
        1.0,
        sinc_parameters(64),
        512,
        1,
        ResamplerType::SincFixedIn,
        DataType::Float64,
    )
    .unwrap();
    let mut fft = Resampler::new_fft(
        44100,
        44100,
        1024,
        4,
        1,
        ResamplerType::FftFixedIn,
        DataType::Float64,
    )
    .unwrap();

    for resampler in [&mut sinc, &mut fft] {
        let output = resampler.process_all(&input).unwrap().to_host_values().unwrap();
        assert_eq!(output.len(), signal.len());
        let (shift, err) = best_shift(&signal, &output, 256, 3584, 2);
        assert!(shift.abs() <= 1, "{}: shifted by {shift}", resampler.res_type());
        assert!(err < 1e-3, "{}: error {err}", resampler.res_type());
    }
}

/// Error of a 44.1 kHz -> 88.2 kHz -> 44.1 kHz FFT round trip.
fn fft_round_trip_error(signal: &[f64], sub_chunks: usize) -> f64 {
    let mut up = Resampler::new_fft(
        44100,
        88200,
        1024,
        sub_chunks,
        1,
        ResamplerType::FftFixedIn,
        DataType::Float64,
    )
    .unwrap();
    let mut down = Resampler::new_fft(
        88200,
        44100,
        1024,
        sub_chunks,
        1,
        ResamplerType::FftFixedOut,
        DataType::Float64,
    )
    .unwrap();

    let upsampled = up.process_all(&mono(signal, DataType::Float64)).unwrap();
    assert_eq!(upsampled.shape().unwrap(), &[2 * signal.len()]);
    let restored = down.process_all(&upsampled).unwrap().to_host_values().unwrap();
    assert_eq!(restored.len(), signal.len());

    let span = signal.len() - 2048;
    let (shift, err) = best_shift(signal, &restored, 1024, span, 2);
    assert!(shift.abs() <= 1, "{sub_chunks} sub-chunks: shifted by {shift}");
    err
}

#[test]
fn fft_up_down_round_trip() {
    let signal = sine(1000.0, 44100.0, 8192);
    let err = fft_round_trip_error(&signal, 2);
    assert!(err < 1e-2, "round trip error {err}");
}

#[test]
fn fft_sub_chunks_keep_low_band_intact() {
    let signal = multi_tone::<f64>(&[220.0, 660.0, 1500.0, 2000.0], 44100.0, 8192, 0.8)
        .unwrap()
        .to_vec();
    for sub_chunks in [1, 2, 4, 8] {
        let err = fft_round_trip_error(&signal, sub_chunks);
        assert!(err < 1e-2, "{sub_chunks} sub-chunks: error {err}");
    }
}

#[test]
fn fft_sub_chunks_trade_high_band_for_latency() {
    let signal = sine(15000.0, 44100.0, 8192);
    let whole = fft_round_trip_error(&signal, 1);
    let split = fft_round_trip_error(&signal, 32);
    assert!(whole < 1e-2, "1 sub-chunk: error {whole}");
    assert!(split > whole, "32 sub-chunks: {split}, 1 sub-chunk: {whole}");

    let delay = |sub_chunks| {
        Resampler::new_fft(44100, 88200, 1024, sub_chunks, 1, ResamplerType::FftFixedIn, DataType::Float64)
            .unwrap()
            .output_delay()
    };
    assert!(delay(32) < delay(1));
}

#[test]
fn longer_sinc_kernels_round_trip_better() {
    let signal = sine(2000.0, 16000.0, 4000);
    let round_trip_error = |sinc_len: usize| {
        let mut up = Resampler::new_sinc(
            1.5,
            1.0,
            sinc_parameters(sinc_len),
            256,
            1,
            ResamplerType::SincFixedIn,
            DataType::Float64,
        )
        .unwrap();
        let mut down = Resampler::new_sinc(
            1.0 / 1.5,
            1.0,
            sinc_parameters(sinc_len),
            256,
            1,
            ResamplerType::SincFixedIn,
            DataType::Float64,
        )
        .unwrap();
        let upsampled = up.process_all(&mono(&signal, DataType::Float64)).unwrap();
        let restored = down.process_all(&upsampled).unwrap().to_host_values().unwrap();
        best_shift(&signal, &restored, 500, 3000, 2).1
    };
    let short = round_trip_error(8);
    let long = round_trip_error(64);
    assert!(long < short, "sinc_len 64: {long}, sinc_len 8: {short}");
    assert!(long < 1e-2);
}

fn ramp_values(start: usize, len: usize) -> SampleBuffer {
    let values: Vec<f64> = (start..start + len).map(|n| n as f64).collect();
    mono(&values, DataType::Float64)
}

fn linear_resampler(chunk_size: usize) -> Resampler {
    Resampler::new_fast(
        1.0,
        3.0,
        PolynomialDegree::Linear,
        chunk_size,
        1,
        ResamplerType::FastFixedIn,
        DataType::Float64,
    )
    .unwrap()
}

#[test]
fn ramped_ratio_changes_monotonically() {
    // Linear interpolation reproduces a ramp exactly, so the difference
    // between consecutive outputs is the instantaneous input step 1 / ratio.
    let mut r = linear_resampler(64);
    r.process(&ramp_values(0, 64)).unwrap();
    r.set_resample_ratio(0.5, true).unwrap();
    assert_eq!(r.resample_ratio(), 0.5);

    let out = r.process(&ramp_values(64, 64)).unwrap().to_host_values().unwrap();
    let steps: Vec<f64> = out.windows(2).map(|w| w[1] - w[0]).collect();
    assert!((steps[0] - 1.0).abs() < 0.1, "first step {}", steps[0]);
    assert!(steps[steps.len() - 1] > 1.6, "last step {}", steps[steps.len() - 1]);
    for pair in steps.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-6, "steps {pair:?}");
    }

    // The ramp is over: the next call runs at the new ratio throughout.
    let out = r.process(&ramp_values(128, 64)).unwrap().to_host_values().unwrap();
    for w in out.windows(2) {
        assert!((w[1] - w[0] - 2.0).abs() < 1e-6);
    }
}

#[test]
fn unramped_ratio_change_is_immediate() {
    let mut r = linear_resampler(64);
    r.process(&ramp_values(0, 64)).unwrap();
    r.set_resample_ratio_relative(0.5, false).unwrap();
    let out = r.process(&ramp_values(64, 64)).unwrap().to_host_values().unwrap();
    assert!((31..=33).contains(&out.len()), "{} frames", out.len());
    for w in out.windows(2) {
        assert!((w[1] - w[0] - 2.0).abs() < 1e-6);
    }
}

#[test]
fn ratio_changes_are_validated() {
    let mut r = linear_resampler(16);
    assert!(matches!(
        r.set_resample_ratio(-1.0, false),
        Err(EngineError::InvalidParameter { .. })
    ));
    assert!(matches!(
        r.set_resample_ratio(4.0, true),
        Err(EngineError::InvalidParameter { .. })
    ));
    assert!((r.resample_ratio() - 1.0).abs() < 1e-12);

    let mut fft = Resampler::new_fft(
        48000,
        44100,
        441,
        1,
        1,
        ResamplerType::FftFixedIn,
        DataType::Float32,
    )
    .unwrap();
    assert!(matches!(
        fft.set_resample_ratio(0.9, false),
        Err(EngineError::InvalidParameter { .. })
    ));
}

#[test]
fn reset_is_idempotent() {
    let chunk = sine(300.0, 8000.0, 128);
    let input = mono(&chunk, DataType::Float32);
    for res_type in [ResamplerType::SincFixedIn, ResamplerType::FftFixedIn] {
        let build = || {
            let built = if res_type.is_fft() {
                Resampler::new_fft(8000, 12000, 128, 1, 1, res_type, DataType::Float32)
            } else {
                Resampler::new_sinc(
                    1.5,
                    1.0,
                    sinc_parameters(16),
                    128,
                    1,
                    res_type,
                    DataType::Float32,
                )
            };
            built.unwrap()
        };

        let mut fresh = build();
        let expected = fresh.process(&input).unwrap();

        let mut used = build();
        used.process(&input).unwrap();
        used.process(&input).unwrap();
        used.reset();
        used.reset();
        assert_eq!(used.input_frames_next(), fresh.chunk_size());
        let actual = used.process(&input).unwrap();
        assert!(actual.eq(&expected).unwrap(), "{res_type}");
    }
}

#[test]
fn failed_calls_leave_state_untouched() {
    let signal = sine(500.0, 8000.0, 300);
    let mut clean = Resampler::new_sinc(
        0.75,
        1.0,
        sinc_parameters(16),
        96,
        1,
        ResamplerType::SincFixedOut,
        DataType::Float64,
    )
    .unwrap();
    let mut disturbed = Resampler::new_sinc(
        0.75,
        1.0,
        sinc_parameters(16),
        96,
        1,
        ResamplerType::SincFixedOut,
        DataType::Float64,
    )
    .unwrap();

    let mut offset = 0;
    for _ in 0..2 {
        let next = clean.input_frames_next();
        assert_eq!(disturbed.input_frames_next(), next);
        let block = mono(&signal[offset..offset + next], DataType::Float64);
        let short = mono(&signal[offset..offset + next - 1], DataType::Float64);
        offset += next;

        assert!(matches!(
            disturbed.process(&short),
            Err(EngineError::SizeMismatch { .. })
        ));
        let wrong_precision = mono(&signal[..next], DataType::Float32);
        assert!(matches!(
            disturbed.process(&wrong_precision),
            Err(EngineError::DtypeMismatch { .. })
        ));

        let expected = clean.process(&block).unwrap();
        let actual = disturbed.process(&block).unwrap();
        assert_eq!(expected.shape().unwrap(), &[96]);
        assert!(actual.eq(&expected).unwrap());
    }
}

#[test]
fn fixed_output_streams_constant_chunks() {
    let signal = sine(440.0, 48000.0, 48000);
    // 294 output frames split in two are whole 147-frame transforms at 48000:44100.
    for (res_type, chunk) in [(ResamplerType::FftFixedOut, 294), (ResamplerType::SincFixedOut, 256)] {
        let mut r = if res_type.is_fft() {
            Resampler::new_fft(48000, 44100, chunk, 2, 1, res_type, DataType::Float32)
        } else {
            Resampler::new_sinc(
                44100.0 / 48000.0,
                1.0,
                sinc_parameters(32),
                chunk,
                1,
                res_type,
                DataType::Float32,
            )
        }
        .unwrap();

        let mut offset = 0;
        while offset + r.input_frames_max() <= signal.len() {
            let next = r.input_frames_next();
            assert!(next <= r.input_frames_max());
            assert_eq!(r.output_frames_next(), chunk);
            let block = mono(&signal[offset..offset + next], DataType::Float32);
            offset += next;
            let out = r.process(&block).unwrap();
            assert_eq!(out.shape().unwrap(), &[chunk], "{res_type}");
        }
    }
}

#[test]
fn channels_share_timing() {
    let left = sine(700.0, 16000.0, 256);
    let right: Vec<f64> = left.iter().map(|v| 2.0 * v).collect();
    let values: Vec<f64> = left.iter().chain(&right).copied().collect();
    let stereo = SampleBuffer::new(&values, &[2, 256], DataType::Float64).unwrap();

    let mut r = Resampler::new_fast(
        0.6,
        1.0,
        PolynomialDegree::Septic,
        256,
        2,
        ResamplerType::FastFixedIn,
        DataType::Float64,
    )
    .unwrap();
    let out = r.process(&stereo).unwrap();
    let frames = out.shape().unwrap()[1];
    assert_eq!(out.shape().unwrap()[0], 2);
    let values = out.to_host_values().unwrap();
    for i in 0..frames {
        assert!((values[frames + i] - 2.0 * values[i]).abs() < 1e-12);
    }
}

#[test]
fn concrete_cubic_downsampling() {
    let mut r = Resampler::new_fast(
        22050.0 / 44100.0,
        1.0,
        PolynomialDegree::Cubic,
        4,
        1,
        ResamplerType::FastFixedIn,
        DataType::Float64,
    )
    .unwrap();
    assert_eq!(r.res_type(), ResamplerType::FastFixedIn);
    assert_eq!(r.dtype(), DataType::Float64);

    let input = [1.0, 0.0, -1.0, 0.0];
    let out = r
        .process_all(&mono(&input, DataType::Float64))
        .unwrap()
        .to_host_values()
        .unwrap();
    assert_eq!(out.len(), 2);
    // Cubic interpolation at whole input positions returns the samples
    // themselves: the frames read input positions 0 and 2, or lag one
    // output frame behind.
    let aligned = [[1.0, -1.0], [0.0, 1.0]]
        .iter()
        .any(|expected| max_abs_diff_slice(&out, expected) < 1e-3);
    assert!(aligned, "unexpected frames {out:?}");
}

#[test]
fn invalid_inputs_are_rejected() {
    let mut r = linear_resampler(8);
    let complex = SampleBuffer::new(&[0.0; 16], &[8], DataType::Complex64).unwrap();
    assert!(matches!(r.process(&complex), Err(EngineError::UnsupportedDtype(_))));
    assert!(matches!(
        r.process(&ramp_values(0, 9)),
        Err(EngineError::SizeMismatch { expected: 8, actual: 9, .. })
    ));
    assert!(matches!(
        Resampler::new_sinc(
            1.0,
            1.0,
            SincInterpolationParameters {
                f_cutoff: 0.0,
                ..Default::default()
            },
            8,
            1,
            ResamplerType::SincFixedIn,
            DataType::Float32,
        ),
        Err(EngineError::InvalidParameter { .. })
    ));
}

use giztoy_resampler::{QUALITY_DEFAULT, Session};

const FROM_BASE: u32 = 48000;
const IN_LEN: usize = 960;
/// Frames fed per ratio; convergence is measured over the whole run.
const REPEATS: usize = 40;

/// Interleaved sine frames: even channels carry sin, odd channels cos.
fn sine_pcm_int(samples: usize, channels: usize) -> Vec<i16> {
    let mut pcm = vec![0i16; samples * channels];
    for s in 0..samples {
        let (sin, cos) = (std::f64::consts::TAU / samples as f64 * s as f64).sin_cos();
        for c in 0..channels {
            let v = if c & 1 == 0 { sin } else { cos };
            pcm[s * channels + c] = (v * i16::MAX as f64) as i16;
        }
    }
    pcm
}

fn sine_pcm_float(samples: usize, channels: usize) -> Vec<f32> {
    let mut pcm = vec![0f32; samples * channels];
    for s in 0..samples {
        let (sin, cos) = (std::f64::consts::TAU / samples as f64 * s as f64).sin_cos();
        for c in 0..channels {
            pcm[s * channels + c] = if c & 1 == 0 { sin as f32 } else { cos as f32 };
        }
    }
    pcm
}

/// Ratios 0.10, 0.15, ..., 1.95.
fn ratios(from: f64) -> impl Iterator<Item = f64> {
    (0..)
        .map(move |k| from + 0.05 * k as f64)
        .take_while(|&r| r < 2.0 - 1e-9)
}

fn to_base(ratio: f64) -> u32 {
    (FROM_BASE as f64 * ratio) as u32
}

#[test]
fn test_planar_int_drains_and_converges() {
    for ratio in ratios(0.1) {
        for channels in [1u32, 2] {
            let pcm = sine_pcm_int(IN_LEN, channels as usize);
            let mut s = Session::new(channels, FROM_BASE, to_base(ratio), QUALITY_DEFAULT).unwrap();
            let mut out = 0;
            let mut steps = 0;
            for _ in 0..REPEATS {
                let mut pos = 0;
                while pos < pcm.len() {
                    let r = s.process_planar_int(0, &pcm[pos..]).unwrap();
                    pos += r.consumed;
                    out += r.samples.len();
                    steps += 1;
                    assert!(steps < 1000 * REPEATS, "no progress at ratio {}", ratio);
                }
                assert_eq!(pos, pcm.len());
            }
            let got = out as f64 / (pcm.len() * REPEATS) as f64;
            assert!(
                (got - ratio).abs() <= 1e-2,
                "ratio {} channels {}: got {} in {} steps",
                ratio,
                channels,
                got,
                steps
            );
        }
    }
}

#[test]
fn test_interleaved_int_drains_and_converges() {
    for ratio in ratios(0.1) {
        let channels = 2u32;
        let pcm = sine_pcm_int(IN_LEN, channels as usize);
        let mut s = Session::new(channels, FROM_BASE, to_base(ratio), QUALITY_DEFAULT).unwrap();
        let mut out = 0;
        for _ in 0..REPEATS {
            let mut pos = 0;
            while pos < pcm.len() {
                let r = s.process_interleaved_int(&pcm[pos..]).unwrap();
                pos += r.consumed * channels as usize;
                out += r.samples.len();
                assert_eq!(r.samples.len() % channels as usize, 0);
            }
        }
        let got = out as f64 / (pcm.len() * REPEATS) as f64;
        assert!((got - ratio).abs() <= 1e-2, "ratio {}: got {}", ratio, got);
    }
}

#[test]
fn test_planar_float_drains_and_converges() {
    for ratio in ratios(0.5) {
        for channels in [1u32, 2] {
            let pcm = sine_pcm_float(IN_LEN, channels as usize);
            let mut s = Session::new(channels, FROM_BASE, to_base(ratio), QUALITY_DEFAULT).unwrap();
            let mut out = 0;
            for _ in 0..REPEATS {
                let mut pos = 0;
                while pos < pcm.len() {
                    let r = s.process_planar_float(0, &pcm[pos..]).unwrap();
                    pos += r.consumed;
                    out += r.samples.len();
                }
            }
            let got = out as f64 / (pcm.len() * REPEATS) as f64;
            assert!((got - ratio).abs() <= 0.1, "ratio {}: got {}", ratio, got);
        }
    }
}

#[test]
fn test_interleaved_float_drains_and_converges() {
    for ratio in ratios(0.1) {
        for channels in [1u32, 2] {
            let pcm = sine_pcm_float(IN_LEN, channels as usize);
            let mut s = Session::new(channels, FROM_BASE, to_base(ratio), QUALITY_DEFAULT).unwrap();
            let mut out = 0;
            for _ in 0..REPEATS {
                let mut pos = 0;
                while pos < pcm.len() {
                    let r = s.process_interleaved_float(&pcm[pos..]).unwrap();
                    pos += r.consumed * channels as usize;
                    out += r.samples.len();
                }
            }
            let got = out as f64 / (pcm.len() * REPEATS) as f64;
            assert!((got - ratio).abs() <= 1e-2, "ratio {}: got {}", ratio, got);
        }
    }
}

#[test]
fn test_drain_with_tiny_output_capacity() {
    // A session sized with no headroom still drains; every call makes progress.
    let mut s = Session::new(1, 8000, 48000, QUALITY_DEFAULT)
        .unwrap()
        .with_safety_factor(1.0);
    let pcm = sine_pcm_int(IN_LEN, 1);
    let mut pos = 0;
    let mut steps = 0;
    while pos < pcm.len() {
        let chunk_end = (pos + 7).min(pcm.len());
        let r = s.process_planar_int(0, &pcm[pos..chunk_end]).unwrap();
        assert!(r.consumed > 0 || !r.samples.is_empty());
        pos += r.consumed;
        steps += 1;
        assert!(steps < 10_000);
    }
}

#[test]
fn test_48k_to_44k1_scenario() {
    let mut s = Session::new(1, 48000, 44100, 4).unwrap();
    let frame = sine_pcm_int(IN_LEN, 1);
    let mut total_in = 0;
    let mut total_out = 0;
    for _ in 0..100 {
        let mut pos = 0;
        while pos < frame.len() {
            let r = s.process_planar_int(0, &frame[pos..]).unwrap();
            pos += r.consumed;
            total_out += r.samples.len();
        }
        total_in += frame.len();
    }
    let got = total_out as f64 / total_in as f64;
    let want = 44100.0 / 48000.0;
    assert!((got - want).abs() / want < 0.01, "got {}", got);
}

#[test]
fn test_stereo_planar_channels_stay_in_step() {
    let mut s = Session::new(2, 48000, 32000, QUALITY_DEFAULT).unwrap();
    let pcm = sine_pcm_float(IN_LEN, 2);
    let planes = giztoy_resampler::deinterleave(&pcm, 2).unwrap();
    let mut outs = vec![Vec::new(), Vec::new()];
    for (ch, plane) in planes.iter().enumerate() {
        let mut pos = 0;
        while pos < plane.len() {
            let r = s.process_planar_float(ch as u32, &plane[pos..]).unwrap();
            pos += r.consumed;
            outs[ch].extend_from_slice(r.samples);
        }
    }
    assert_eq!(outs[0].len(), outs[1].len());
    assert!(outs[0].len() > 580 && outs[0].len() <= 640, "got {}", outs[0].len());
    let mixed = giztoy_resampler::interleave(&[&outs[0][..], &outs[1][..]]).unwrap();
    assert_eq!(mixed.len(), outs[0].len() * 2);
}

#[test]
fn test_large_coprime_ratio_drains() {
    // 3000000001 and 4000000000 share no factor, so the ratio stays as is.
    let mut s = Session::new_frac(1, 3_000_000_001, 4_000_000_000, 48000, 48000, 0).unwrap();
    assert_eq!(s.ratio().unwrap(), (3_000_000_001, 4_000_000_000));
    let pcm = sine_pcm_float(IN_LEN, 1);
    let mut out = 0;
    for _ in 0..REPEATS {
        let mut pos = 0;
        let mut steps = 0;
        while pos < pcm.len() {
            let r = s.process_planar_float(0, &pcm[pos..]).unwrap();
            pos += r.consumed;
            out += r.samples.len();
            steps += 1;
            assert!(steps < 1000);
        }
    }
    let got = out as f64 / (IN_LEN * REPEATS) as f64;
    assert!((got - 4.0 / 3.0).abs() < 0.01, "got {}", got);
}

#[test]
fn test_interleaved_after_planar_exposes_whole_frames() {
    // Run channel 0 ahead through planar calls, then switch to interleaved.
    let mut s = Session::new(2, 48000, 48000, 0).unwrap();
    let plane = vec![0.5f32; 320];
    let mut pos = 0;
    while pos < plane.len() {
        pos += s.process_planar_float(0, &plane[pos..]).unwrap().consumed;
    }

    let pcm = sine_pcm_float(IN_LEN, 2);
    let mut frames = [0usize; 2];
    for _ in 0..4 {
        let mut pos = 0;
        while pos < pcm.len() {
            let r = s.process_interleaved_float(&pcm[pos..]).unwrap();
            pos += r.consumed * 2;
            assert_eq!(r.samples.len() % 2, 0);
            frames[0] += r.samples.len() / 2;
        }
        frames[1] += IN_LEN;
    }
    // Channel 1 lags channel 0, so output tracks channel 1's input.
    assert!(frames[0] <= frames[1]);
    assert!(frames[0] as f64 > frames[1] as f64 * 0.98, "got {:?}", frames);
}

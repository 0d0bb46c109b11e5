//! Audio Test Fixtures
//!
//! 16-bit signed little-endian PCM, mono, generated in code so tests have
//! no file dependencies.

use std::f32::consts::PI;
use std::io::Cursor;

/// Standard sample rate for recognition (16kHz)
pub const SAMPLE_RATE: u32 = 16000;

/// 100ms at 16kHz
pub const MS_100: usize = 1600;

pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

pub fn generate_silence_bytes(duration_samples: usize) -> Vec<u8> {
    vec![0u8; duration_samples * 2]
}

/// Sine tone with amplitude in 0.0 - 1.0
pub fn generate_sine_wave(duration_samples: usize, frequency: f32, amplitude: f32) -> Vec<i16> {
    let max_amplitude = amplitude.clamp(0.0, 1.0) * i16::MAX as f32;
    (0..duration_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            ((2.0 * PI * frequency * t).sin() * max_amplitude) as i16
        })
        .collect()
}

pub fn generate_sine_wave_bytes(duration_samples: usize, frequency: f32) -> Vec<u8> {
    samples_to_bytes(&generate_sine_wave(duration_samples, frequency, 0.5))
}

/// Wrap interleaved 16-bit samples in a WAV container.
pub fn wav_file(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

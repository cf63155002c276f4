//! Tone synthesizer - the default `AudioRenderer`.
//!
//! Every entity opens with a short "bip" (the interaction point), continues
//! with a steady tone for its time in the inner detector, marks the step into
//! the calorimeter with a high tick, and ends with a ten-note melody whose
//! loudness follows the cluster energy.

use crate::audio::AudioRenderer;
use crate::error::RenderError;
use crate::types::Profile;
use hound::{SampleFormat, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::path::Path;

/// Full scale of a 16-bit PCM sample.
pub const MAX_AMPLITUDE: f64 = i16::MAX as f64;

/// Loudness of the track tones.
pub const DEFAULT_AMPLITUDE: f64 = MAX_AMPLITUDE / 16.0;

pub const NOTE_A5: f64 = 880.0;
pub const NOTE_C6: f64 = 1046.50;
pub const NOTE_D6: f64 = 1174.66;
pub const NOTE_F7: f64 = 2793.83;

/// Frequencies (Hz) of the cluster melody, 0.1 s each.
pub const CLUSTER_MELODY: [f64; 10] = [300.0, 350.0, 600.0, 800.0, 1000.0, 800.0, 800.0, 1000.0, 700.0, 600.0];

const CLUSTER_NOTE_SECONDS: f64 = 0.1;
const CLUSTER_GAIN: f64 = 2000.0;
const CLUSTER_FLOOR: f64 = 100.0;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the tone synthesizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Output sample rate in Hz (default: 44100)
    pub sample_rate: u32,

    /// Amplitude of the track tones on the int16 scale (default: 32767 / 16)
    pub track_amplitude: f64,

    /// Duration of a track tone in the inner detector (default: 2.0 s)
    pub track_seconds: f64,

    /// Duration of the inner detector to calorimeter tick (default: 0.1 s)
    pub tick_seconds: f64,

    /// Duration of the opening bip (default: 0.1 s)
    pub bip_seconds: f64,

    /// Silence appended to muon sounds (default: 0.5 s)
    pub muon_tail_seconds: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            track_amplitude: DEFAULT_AMPLITUDE,
            track_seconds: 2.0,
            tick_seconds: 0.1,
            bip_seconds: 0.1,
            muon_tail_seconds: 0.5,
        }
    }
}

// ============================================================================
// SOUND TRACK
// ============================================================================

/// Mono sample buffer with a write cue.
///
/// Writes start at the cue and advance it. Rewinding the cue and writing
/// again mixes the new samples into the existing ones.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundTrack {
    sample_rate: u32,
    samples: Vec<f32>,
    cue: usize,
}

impl SoundTrack {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
            cue: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total length in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Current write position, in samples.
    pub fn cue(&self) -> usize {
        self.cue
    }

    /// Moves the write position. Positions past the end pad with silence.
    pub fn set_cue(&mut self, position: usize) -> &mut Self {
        if position > self.samples.len() {
            self.samples.resize(position, 0.0);
        }
        self.cue = position;
        self
    }

    fn to_samples(&self, seconds: f64) -> usize {
        (seconds * self.sample_rate as f64).round().max(0.0) as usize
    }

    fn write(&mut self, values: impl Iterator<Item = f32>) {
        for value in values {
            if self.cue < self.samples.len() {
                self.samples[self.cue] += value;
            } else {
                self.samples.push(value);
            }
            self.cue += 1;
        }
    }

    /// Writes a sine tone at the cue.
    pub fn add_sine_wave(&mut self, frequency: f64, seconds: f64, amplitude: f64) -> &mut Self {
        let n = self.to_samples(seconds);
        let rate = self.sample_rate as f64;
        self.write((0..n).map(|i| (amplitude * (TAU * frequency * i as f64 / rate).sin()) as f32));
        self
    }

    /// Advances the cue by `seconds`, extending the buffer with silence if needed.
    pub fn add_blank(&mut self, seconds: f64) -> &mut Self {
        let n = self.to_samples(seconds);
        self.write(std::iter::repeat(0.0).take(n));
        self
    }

    /// Mixes another track in at the cue.
    pub fn add_track(&mut self, other: &SoundTrack) -> &mut Self {
        self.write(other.samples.iter().copied());
        self
    }

    /// Largest absolute sample value in `[from, to)` seconds.
    pub fn peak(&self, from: f64, to: f64) -> f32 {
        let start = self.to_samples(from).min(self.samples.len());
        let end = self.to_samples(to).min(self.samples.len());
        self.samples[start..end.max(start)]
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Writes the buffer as 16-bit mono PCM. Samples outside the int16 range are clipped.
    pub fn write_wav(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            let clipped = sample.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            writer.write_sample(clipped)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

// ============================================================================
// TONE SYNTH
// ============================================================================

/// Builds the fixed waveform sequence of each profile.
#[derive(Debug, Clone, Default)]
pub struct ToneSynth {
    config: SynthConfig,
}

impl ToneSynth {
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    fn bip(&self) -> SoundTrack {
        let mut sound = SoundTrack::new(self.config.sample_rate);
        sound.add_sine_wave(NOTE_A5, self.config.bip_seconds, self.config.track_amplitude);
        sound
    }

    fn inner_single(&self, sound: &mut SoundTrack, seconds: f64) {
        sound.add_sine_wave(NOTE_D6, seconds, self.config.track_amplitude);
    }

    fn inner_double(&self, sound: &mut SoundTrack, seconds: f64) {
        let cue = sound.cue();
        sound.add_sine_wave(NOTE_C6, seconds, self.config.track_amplitude);
        sound.set_cue(cue).add_sine_wave(NOTE_D6, seconds, self.config.track_amplitude);
    }

    fn tickmark(&self, sound: &mut SoundTrack) {
        sound.add_sine_wave(NOTE_F7, self.config.tick_seconds, self.config.track_amplitude);
    }

    fn cluster_melody(&self, sound: &mut SoundTrack, amplitude: f64) {
        let level = if amplitude != 0.0 {
            amplitude * CLUSTER_GAIN + CLUSTER_FLOOR
        } else {
            0.0
        };
        for frequency in CLUSTER_MELODY {
            sound.add_sine_wave(frequency, CLUSTER_NOTE_SECONDS, level);
        }
    }

    /// Muons cross the whole detector: the track tone keeps sounding under
    /// (and after) whatever the calorimeter contributes.
    fn muon_tail(&self, sound: &mut SoundTrack, cue: usize) {
        let half = self.config.track_seconds / 2.0;
        sound.set_cue(cue);
        self.inner_single(sound, half);
        self.inner_single(sound, self.config.track_seconds);
        sound.add_blank(self.config.muon_tail_seconds);
    }

    /// Builds the clip for one profile.
    pub fn clip(&self, profile: Profile, amplitude: f64, companion_present: bool) -> SoundTrack {
        let track_seconds = self.config.track_seconds;
        let mut sound = self.bip();

        match profile {
            Profile::ClusterOnly => {
                sound.add_blank(track_seconds);
            }
            Profile::DoubleTrackWithCluster => self.inner_double(&mut sound, track_seconds),
            Profile::SingleTrackWithCluster if companion_present => {
                self.inner_double(&mut sound, track_seconds)
            }
            _ => self.inner_single(&mut sound, track_seconds),
        }
        self.tickmark(&mut sound);

        let cue = sound.cue();
        if profile.has_cluster() {
            self.cluster_melody(&mut sound, amplitude);
        }
        if matches!(profile, Profile::MuonWithCluster | Profile::MuonOnly) {
            self.muon_tail(&mut sound, cue);
        }

        sound
    }
}

impl AudioRenderer for ToneSynth {
    type Clip = SoundTrack;

    fn empty(&self) -> SoundTrack {
        SoundTrack::new(self.config.sample_rate)
    }

    fn render(
        &mut self,
        profile: Profile,
        amplitude: f64,
        companion_present: bool,
    ) -> Result<SoundTrack, RenderError> {
        if !amplitude.is_finite() {
            return Err(RenderError::InvalidAmplitude(amplitude));
        }
        Ok(self.clip(profile, amplitude, companion_present))
    }

    fn append(&mut self, into: &mut SoundTrack, clip: &SoundTrack, gap_seconds: f64) {
        into.add_track(clip).add_blank(gap_seconds);
    }
}

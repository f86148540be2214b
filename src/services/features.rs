use crate::services::dsp::{
    apply_filterbank, bin_frequencies, dct_ii, frame_iter, mean, median_filter_freq,
    median_filter_time, mel_filterbank, power_to_db, std_dev, stft_magnitude, to_power, HOP_LENGTH,
    N_FFT,
};

const N_MELS: usize = 128;
const N_MFCC: usize = 13;
const PITCH_FMIN: f32 = 50.0;
const PITCH_FMAX: f32 = 500.0;
const HPSS_KERNEL: usize = 31;

/// Aggregate signal statistics fed to the classifier.
#[derive(Debug, Clone, Default)]
pub struct AudioFeatures {
    pub mfcc_variance: f32,
    pub mfcc_std_mean: f32,
    pub mfcc_delta_std: f32,
    pub mfcc_delta2_std: f32,
    pub pitch_mean: f32,
    pub pitch_std: f32,
    pub pitch_range: f32,
    pub pitch_cv: f32,
    pub pitch_jumps: f32,
    pub spectral_centroid_mean: f32,
    pub spectral_centroid_std: f32,
    pub spectral_bandwidth_mean: f32,
    pub spectral_bandwidth_std: f32,
    pub spectral_rolloff_mean: f32,
    pub spectral_flatness_mean: f32,
    pub spectral_flatness_std: f32,
    pub spectral_contrast_mean: f32,
    pub zcr_mean: f32,
    pub zcr_std: f32,
    pub rms_mean: f32,
    pub rms_std: f32,
    pub rms_cv: f32,
    pub silence_ratio: f32,
    pub harmonic_ratio: f32,
    pub jitter: f32,
    pub shimmer: f32,
}

/// Extracts [`AudioFeatures`] from a mono 16 kHz signal. The magnitude
/// spectrogram is computed once and shared across feature groups.
pub struct FeatureExtractor<'a> {
    y: &'a [f32],
    sample_rate: u32,
    magnitude: Vec<Vec<f32>>,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(y: &'a [f32], sample_rate: u32) -> Self {
        let magnitude = stft_magnitude(y, N_FFT, HOP_LENGTH);
        Self {
            y,
            sample_rate,
            magnitude,
        }
    }

    pub fn extract(&self) -> AudioFeatures {
        let mut features = AudioFeatures::default();
        self.mfcc_features(&mut features);
        self.pitch_features(&mut features);
        self.spectral_features(&mut features);
        self.temporal_features(&mut features);
        // Shimmer reuses rms_cv, so temporal features must come first.
        self.voice_quality_features(&mut features);
        features
    }

    // MFCC statistics. Synthetic voices tend toward uniform cepstral patterns,
    // so the classifier watches overall variance and delta spread.
    fn mfcc_features(&self, features: &mut AudioFeatures) {
        let power = to_power(&self.magnitude);
        let bank = mel_filterbank(self.sample_rate, N_FFT, N_MELS);
        let mut mel = apply_filterbank(&power, &bank);
        power_to_db(&mut mel);

        let mfcc: Vec<Vec<f32>> = mel.iter().map(|frame| dct_ii(frame, N_MFCC)).collect();
        if mfcc.is_empty() {
            return;
        }

        let flat: Vec<f32> = mfcc.iter().flatten().copied().collect();
        let flat_std = std_dev(&flat);
        features.mfcc_variance = flat_std * flat_std;

        let mut per_coeff_std = Vec::with_capacity(N_MFCC);
        let mut delta_flat = Vec::with_capacity(flat.len());
        let mut delta2_flat = Vec::with_capacity(flat.len());
        for k in 0..N_MFCC {
            let series: Vec<f32> = mfcc.iter().map(|frame| frame[k]).collect();
            per_coeff_std.push(std_dev(&series));
            let delta = regression_delta(&series);
            let delta2 = regression_delta(&delta);
            delta_flat.extend_from_slice(&delta);
            delta2_flat.extend_from_slice(&delta2);
        }
        features.mfcc_std_mean = mean(&per_coeff_std);
        features.mfcc_delta_std = std_dev(&delta_flat);
        features.mfcc_delta2_std = std_dev(&delta2_flat);
    }

    // Per-frame fundamental estimate: strongest spectral peak in the speech
    // band, refined by parabolic interpolation, gated at 10% of the frame peak.
    fn pitch_features(&self, features: &mut AudioFeatures) {
        let freqs = bin_frequencies(self.sample_rate, N_FFT);
        let bin_lo = freqs.iter().position(|&f| f >= PITCH_FMIN).unwrap_or(0);
        let bin_hi = freqs
            .iter()
            .position(|&f| f > PITCH_FMAX)
            .unwrap_or(freqs.len());

        let mut pitches: Vec<f32> = Vec::new();
        for frame in &self.magnitude {
            let frame_max = frame.iter().fold(0.0f32, |a, &m| a.max(m));
            if frame_max <= 0.0 {
                continue;
            }
            let band = &frame[bin_lo..bin_hi];
            let mut best = 0usize;
            let mut best_mag = 0.0f32;
            for (i, &m) in band.iter().enumerate() {
                if m > best_mag {
                    best_mag = m;
                    best = i;
                }
            }
            if best_mag < 0.1 * frame_max {
                continue;
            }

            let bin = bin_lo + best;
            let pitch = if bin > 0 && bin + 1 < frame.len() {
                let (a, b, c) = (frame[bin - 1], frame[bin], frame[bin + 1]);
                let denom = a - 2.0 * b + c;
                let shift = if denom.abs() > 1e-12 {
                    (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
                } else {
                    0.0
                };
                (bin as f32 + shift) * self.sample_rate as f32 / N_FFT as f32
            } else {
                freqs[bin]
            };
            if pitch > 0.0 {
                pitches.push(pitch);
            }
        }

        if pitches.len() > 10 {
            features.pitch_mean = mean(&pitches);
            features.pitch_std = std_dev(&pitches);
            let lo = pitches.iter().fold(f32::INFINITY, |a, &p| a.min(p));
            let hi = pitches.iter().fold(f32::NEG_INFINITY, |a, &p| a.max(p));
            features.pitch_range = hi - lo;
            features.pitch_cv = if features.pitch_mean > 0.0 {
                features.pitch_std / features.pitch_mean
            } else {
                0.0
            };
            let jumps: Vec<f32> = pitches.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
            features.pitch_jumps =
                jumps.iter().filter(|&&d| d > 50.0).count() as f32 / jumps.len() as f32;
        }
    }

    fn spectral_features(&self, features: &mut AudioFeatures) {
        let freqs = bin_frequencies(self.sample_rate, N_FFT);
        let n_frames = self.magnitude.len();

        let mut centroids = Vec::with_capacity(n_frames);
        let mut bandwidths = Vec::with_capacity(n_frames);
        let mut rolloffs = Vec::with_capacity(n_frames);
        let mut flatnesses = Vec::with_capacity(n_frames);

        for frame in &self.magnitude {
            let total: f32 = frame.iter().sum();
            if total > 1e-10 {
                let centroid = frame
                    .iter()
                    .zip(freqs.iter())
                    .map(|(&m, &f)| m * f)
                    .sum::<f32>()
                    / total;
                centroids.push(centroid);

                let spread = frame
                    .iter()
                    .zip(freqs.iter())
                    .map(|(&m, &f)| m * (f - centroid) * (f - centroid))
                    .sum::<f32>()
                    / total;
                bandwidths.push(spread.max(0.0).sqrt());

                let threshold = 0.85 * total;
                let mut acc = 0.0f32;
                let mut roll = *freqs.last().unwrap_or(&0.0);
                for (&m, &f) in frame.iter().zip(freqs.iter()) {
                    acc += m;
                    if acc >= threshold {
                        roll = f;
                        break;
                    }
                }
                rolloffs.push(roll);
            } else {
                centroids.push(0.0);
                bandwidths.push(0.0);
                rolloffs.push(0.0);
            }

            // Flatness on the power spectrum with a 1e-10 floor; a silent
            // frame therefore reads as perfectly flat.
            let mut log_sum = 0.0f64;
            let mut lin_sum = 0.0f64;
            for &m in frame {
                let p = (m * m).max(1e-10) as f64;
                log_sum += p.ln();
                lin_sum += p;
            }
            let n = frame.len() as f64;
            let flatness = ((log_sum / n).exp() / (lin_sum / n)) as f32;
            flatnesses.push(flatness);
        }

        features.spectral_centroid_mean = mean(&centroids);
        features.spectral_centroid_std = std_dev(&centroids);
        features.spectral_bandwidth_mean = mean(&bandwidths);
        features.spectral_bandwidth_std = std_dev(&bandwidths);
        features.spectral_rolloff_mean = mean(&rolloffs);
        features.spectral_flatness_mean = mean(&flatnesses);
        features.spectral_flatness_std = std_dev(&flatnesses);
        features.spectral_contrast_mean = self.spectral_contrast_mean(&freqs);
    }

    // Octave-band spectral contrast: mean peak-to-valley spread in dB across
    // bands starting at 200 Hz.
    fn spectral_contrast_mean(&self, freqs: &[f32]) -> f32 {
        const FMIN: f32 = 200.0;
        const N_BANDS: usize = 6;
        const QUANTILE: f32 = 0.02;

        let mut edges = vec![0.0f32, FMIN];
        for k in 1..=N_BANDS {
            edges.push(FMIN * (1 << k) as f32);
        }

        let mut contrasts = Vec::new();
        let mut band_mags: Vec<f32> = Vec::new();
        for band in 0..edges.len() - 1 {
            let lo = edges[band];
            let hi = edges[band + 1];
            for frame in &self.magnitude {
                band_mags.clear();
                for (&m, &f) in frame.iter().zip(freqs.iter()) {
                    if f >= lo && (f < hi || band == edges.len() - 2) {
                        band_mags.push(m);
                    }
                }
                if band_mags.is_empty() {
                    continue;
                }
                band_mags.sort_by(|a, b| a.total_cmp(b));
                let take = ((QUANTILE * band_mags.len() as f32) as usize).max(1);
                let valley = mean(&band_mags[..take]);
                let peak = mean(&band_mags[band_mags.len() - take..]);
                let contrast =
                    10.0 * ((peak.max(1e-10)).log10() - (valley.max(1e-10)).log10());
                contrasts.push(contrast);
            }
        }
        mean(&contrasts)
    }

    fn temporal_features(&self, features: &mut AudioFeatures) {
        let mut zcrs = Vec::new();
        let mut rmss = Vec::new();
        for frame in frame_iter(self.y, N_FFT, HOP_LENGTH) {
            let crossings = frame
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count();
            zcrs.push(crossings as f32 / frame.len() as f32);

            let energy: f32 = frame.iter().map(|&v| v * v).sum::<f32>() / frame.len() as f32;
            rmss.push(energy.sqrt());
        }
        features.zcr_mean = mean(&zcrs);
        features.zcr_std = std_dev(&zcrs);
        features.rms_mean = mean(&rmss);
        features.rms_std = std_dev(&rmss);
        features.rms_cv = if features.rms_mean > 0.0 {
            features.rms_std / features.rms_mean
        } else {
            0.0
        };

        let peak = self.y.iter().fold(0.0f32, |a, &v| a.max(v.abs()));
        let threshold = 0.02 * peak;
        if !self.y.is_empty() {
            let silent = self.y.iter().filter(|v| v.abs() < threshold).count();
            features.silence_ratio = silent as f32 / self.y.len() as f32;
        }
    }

    fn voice_quality_features(&self, features: &mut AudioFeatures) {
        features.harmonic_ratio = self.harmonic_ratio();

        // Jitter: relative frame-to-frame energy drift over 25 ms frames.
        let frame_len = (0.025 * self.sample_rate as f32) as usize;
        let hop = (0.010 * self.sample_rate as f32) as usize;
        if self.y.len() > frame_len && hop > 0 {
            let energies: Vec<f32> = frame_iter(self.y, frame_len, hop)
                .map(|frame| frame.iter().map(|&v| v * v).sum())
                .collect();
            let energy_mean = mean(&energies);
            if energies.len() > 1 && energy_mean > 0.0 {
                let diffs: Vec<f32> = energies.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
                features.jitter = (mean(&diffs) / energy_mean).min(1.0);
            }
        }

        features.shimmer = features.rms_cv;
    }

    // Harmonic/percussive split via median filtering of the magnitude
    // spectrogram, compared as masked energies. Capped at 100 like the
    // downstream threshold expects.
    fn harmonic_ratio(&self) -> f32 {
        if self.magnitude.is_empty() {
            return 0.0;
        }
        let harm = median_filter_time(&self.magnitude, HPSS_KERNEL);
        let perc = median_filter_freq(&self.magnitude, HPSS_KERNEL);

        let mut h_energy = 0.0f64;
        let mut p_energy = 0.0f64;
        for (t, row) in self.magnitude.iter().enumerate() {
            for (b, &m) in row.iter().enumerate() {
                let h2 = (harm[t][b] * harm[t][b]) as f64;
                let p2 = (perc[t][b] * perc[t][b]) as f64;
                let denom = h2 + p2;
                if denom <= 0.0 {
                    continue;
                }
                let power = (m * m) as f64;
                let mask_h = h2 / denom;
                let mask_p = p2 / denom;
                h_energy += power * mask_h * mask_h;
                p_energy += power * mask_p * mask_p;
            }
        }
        if p_energy > 0.0 {
            ((h_energy / p_energy) as f32).min(100.0)
        } else {
            100.0
        }
    }
}

// Regression delta over a time series (width 9), the usual cepstral delta
// formulation. Ends are clamped.
fn regression_delta(series: &[f32]) -> Vec<f32> {
    const HALF: isize = 4;
    const DENOM: f32 = 60.0;
    let len = series.len() as isize;
    if len == 0 {
        return Vec::new();
    }
    (0..len)
        .map(|t| {
            let mut acc = 0.0f32;
            for n in 1..=HALF {
                let ahead = series[(t + n).min(len - 1) as usize];
                let behind = series[(t - n).max(0) as usize];
                acc += n as f32 * (ahead - behind);
            }
            acc / DENOM
        })
        .collect()
}

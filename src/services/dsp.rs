use rustfft::{num_complex::Complex, FftPlanner};

/// Analysis frame size shared by all spectral features.
pub const N_FFT: usize = 2048;
/// Hop between analysis frames.
pub const HOP_LENGTH: usize = 512;

/// Periodic Hann window of length `n`.
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos())
        .collect()
}

fn reflect_pad(y: &[f32], pad: usize) -> Vec<f32> {
    let n = y.len();
    let mut out = Vec::with_capacity(n + 2 * pad);
    if n == 0 {
        return vec![0.0; 2 * pad];
    }
    for i in (1..=pad).rev() {
        out.push(y[i.min(n - 1)]);
    }
    out.extend_from_slice(y);
    for i in 0..pad {
        let idx = n.saturating_sub(2).saturating_sub(i.min(n - 1));
        out.push(y[idx]);
    }
    out
}

/// Centered magnitude spectrogram: one row per frame, `n_fft / 2 + 1` bins.
///
/// The signal is reflect-padded by half a frame so frame count is
/// `1 + len / hop`, and each frame is Hann-windowed before the FFT.
pub fn stft_magnitude(y: &[f32], n_fft: usize, hop: usize) -> Vec<Vec<f32>> {
    let padded = reflect_pad(y, n_fft / 2);
    let window = hann_window(n_fft);
    let n_bins = n_fft / 2 + 1;

    if padded.len() < n_fft {
        return Vec::new();
    }
    let n_frames = (padded.len() - n_fft) / hop + 1;

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);

    let mut frames = Vec::with_capacity(n_frames);
    let mut buf = vec![Complex::new(0.0f32, 0.0f32); n_fft];
    for i in 0..n_frames {
        let start = i * hop;
        for (j, slot) in buf.iter_mut().enumerate() {
            *slot = Complex::new(padded[start + j] * window[j], 0.0);
        }
        fft.process(&mut buf);
        frames.push(buf[..n_bins].iter().map(|c| c.norm()).collect());
    }
    frames
}

/// Element-wise square of a magnitude spectrogram.
pub fn to_power(magnitude: &[Vec<f32>]) -> Vec<Vec<f32>> {
    magnitude
        .iter()
        .map(|row| row.iter().map(|&m| m * m).collect())
        .collect()
}

/// Center frequency of every FFT bin.
pub fn bin_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    let n_bins = n_fft / 2 + 1;
    (0..n_bins)
        .map(|i| i as f32 * sample_rate as f32 / n_fft as f32)
        .collect()
}

// Slaney mel scale: linear below 1 kHz, logarithmic above.
fn hz_to_mel(f: f32) -> f32 {
    if f < 1000.0 {
        3.0 * f / 200.0
    } else {
        15.0 + (f / 1000.0).ln() * 27.0 / 6.4f32.ln()
    }
}

fn mel_to_hz(m: f32) -> f32 {
    if m < 15.0 {
        200.0 * m / 3.0
    } else {
        1000.0 * ((m - 15.0) * 6.4f32.ln() / 27.0).exp()
    }
}

/// Triangular mel filterbank (`n_mels` x `n_fft / 2 + 1`), area-normalized.
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let n_bins = n_fft / 2 + 1;
    let fmax = sample_rate as f32 / 2.0;

    let mel_max = hz_to_mel(fmax);
    let hz_points: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
        .collect();
    let freqs = bin_frequencies(sample_rate, n_fft);

    let mut bank = vec![vec![0.0f32; n_bins]; n_mels];
    for m in 0..n_mels {
        let (f_lo, f_center, f_hi) = (hz_points[m], hz_points[m + 1], hz_points[m + 2]);
        let norm = 2.0 / (f_hi - f_lo);
        for (b, &f) in freqs.iter().enumerate() {
            let rising = (f - f_lo) / (f_center - f_lo);
            let falling = (f_hi - f) / (f_hi - f_center);
            let w = rising.min(falling).max(0.0);
            bank[m][b] = w * norm;
        }
    }
    bank
}

/// Apply a filterbank to a power spectrogram: rows stay frames, columns
/// become filter channels.
pub fn apply_filterbank(power: &[Vec<f32>], bank: &[Vec<f32>]) -> Vec<Vec<f32>> {
    power
        .iter()
        .map(|frame| {
            bank.iter()
                .map(|filter| {
                    filter
                        .iter()
                        .zip(frame.iter())
                        .map(|(&w, &p)| w * p)
                        .sum::<f32>()
                })
                .collect()
        })
        .collect()
}

/// Convert a power spectrogram to decibels in place (ref 1.0, floor 1e-10),
/// clamped to 80 dB below the global peak.
pub fn power_to_db(frames: &mut [Vec<f32>]) {
    const AMIN: f32 = 1e-10;
    const TOP_DB: f32 = 80.0;

    let mut max_db = f32::NEG_INFINITY;
    for row in frames.iter_mut() {
        for v in row.iter_mut() {
            *v = 10.0 * v.max(AMIN).log10();
            if *v > max_db {
                max_db = *v;
            }
        }
    }
    let floor = max_db - TOP_DB;
    for row in frames.iter_mut() {
        for v in row.iter_mut() {
            if *v < floor {
                *v = floor;
            }
        }
    }
}

/// Orthonormal DCT-II of `input`, truncated to the first `n_out` coefficients.
pub fn dct_ii(input: &[f32], n_out: usize) -> Vec<f32> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; n_out];
    }
    let mut out = Vec::with_capacity(n_out);
    for k in 0..n_out {
        let mut sum = 0.0f64;
        for (i, &x) in input.iter().enumerate() {
            let angle = std::f64::consts::PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64;
            sum += x as f64 * angle.cos();
        }
        let scale = if k == 0 {
            (1.0 / n as f64).sqrt()
        } else {
            (2.0 / n as f64).sqrt()
        };
        out.push((sum * scale) as f32);
    }
    out
}

fn median_of(scratch: &mut [f32]) -> f32 {
    if scratch.is_empty() {
        return 0.0;
    }
    let mid = scratch.len() / 2;
    let (_, m, _) = scratch.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *m
}

/// Median filter along the time axis (per frequency bin), window clamped at
/// the spectrogram edges.
pub fn median_filter_time(s: &[Vec<f32>], kernel: usize) -> Vec<Vec<f32>> {
    let n_frames = s.len();
    if n_frames == 0 {
        return Vec::new();
    }
    let n_bins = s[0].len();
    let half = kernel / 2;
    let mut out = vec![vec![0.0f32; n_bins]; n_frames];
    let mut scratch = Vec::with_capacity(kernel);
    for b in 0..n_bins {
        for t in 0..n_frames {
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(n_frames);
            scratch.clear();
            for row in &s[lo..hi] {
                scratch.push(row[b]);
            }
            out[t][b] = median_of(&mut scratch);
        }
    }
    out
}

/// Median filter along the frequency axis (within each frame).
pub fn median_filter_freq(s: &[Vec<f32>], kernel: usize) -> Vec<Vec<f32>> {
    let half = kernel / 2;
    let mut scratch = Vec::with_capacity(kernel);
    s.iter()
        .map(|row| {
            let n_bins = row.len();
            (0..n_bins)
                .map(|b| {
                    let lo = b.saturating_sub(half);
                    let hi = (b + half + 1).min(n_bins);
                    scratch.clear();
                    scratch.extend_from_slice(&row[lo..hi]);
                    median_of(&mut scratch)
                })
                .collect()
        })
        .collect()
}

/// Iterate non-centered frames of `frame_len` samples every `hop` samples.
pub fn frame_iter(y: &[f32], frame_len: usize, hop: usize) -> impl Iterator<Item = &[f32]> {
    let count = if y.len() >= frame_len {
        (y.len() - frame_len) / hop + 1
    } else {
        0
    };
    (0..count).map(move |i| &y[i * hop..i * hop + frame_len])
}

/// Mean of a slice, 0.0 when empty.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    (sum / values.len() as f64) as f32
}

/// Population standard deviation, 0.0 when empty.
pub fn std_dev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values) as f64;
    let var: f64 = values
        .iter()
        .map(|&v| {
            let d = v as f64 - m;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    (var.sqrt()) as f32
}

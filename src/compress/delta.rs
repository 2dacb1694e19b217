// Delta transforms for the binary, image and audio modes.
//
// Byte delta:   d[i] = b[i] - b[i-1] (mod 256), with b[-1] = 0.
// Sample delta: the same over 16-bit little-endian samples; an odd trailing
//               byte is carried through unchanged.

pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut prev = 0u8;
    data.iter()
        .map(|&b| {
            let d = b.wrapping_sub(prev);
            prev = b;
            d
        })
        .collect()
}

pub fn decode(deltas: &[u8]) -> Vec<u8> {
    let mut acc = 0u8;
    deltas
        .iter()
        .map(|&d| {
            acc = acc.wrapping_add(d);
            acc
        })
        .collect()
}

pub fn encode_samples(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut prev = 0u16;
    let samples = data.chunks_exact(2);
    let tail = samples.remainder();
    for pair in samples {
        let sample = u16::from_le_bytes([pair[0], pair[1]]);
        out.extend_from_slice(&sample.wrapping_sub(prev).to_le_bytes());
        prev = sample;
    }
    out.extend_from_slice(tail);
    out
}

pub fn decode_samples(deltas: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(deltas.len());
    let mut acc = 0u16;
    let pairs = deltas.chunks_exact(2);
    let tail = pairs.remainder();
    for pair in pairs {
        acc = acc.wrapping_add(u16::from_le_bytes([pair[0], pair[1]]));
        out.extend_from_slice(&acc.to_le_bytes());
    }
    out.extend_from_slice(tail);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_becomes_constant() {
        let data: Vec<u8> = (10..20).collect();
        let enc = encode(&data);
        assert_eq!(enc[0], 10);
        assert!(enc[1..].iter().all(|&d| d == 1));
        assert_eq!(decode(&enc), data);
    }

    #[test]
    fn wraps_modulo_256() {
        let data = [250, 3, 0, 255];
        assert_eq!(encode(&data), vec![250, 9, 253, 255]);
        assert_eq!(decode(&encode(&data)), data);
    }

    #[test]
    fn sample_ramp_becomes_constant() {
        let mut data = Vec::new();
        for s in (1000u16..1010).map(|v| v * 3) {
            data.extend_from_slice(&s.to_le_bytes());
        }
        let enc = encode_samples(&data);
        assert_eq!(&enc[2..4], &3u16.to_le_bytes());
        assert_eq!(decode_samples(&enc), data);
    }

    #[test]
    fn odd_tail_passes_through() {
        let data = [1, 2, 3, 4, 0xEE];
        let enc = encode_samples(&data);
        assert_eq!(enc[4], 0xEE);
        assert_eq!(decode_samples(&enc), data);
    }
}

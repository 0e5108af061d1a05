pub fn padded_size(size: usize) -> usize {
    let padding = 8;
    ((size as f64 / padding as f64).ceil() as usize) * padding
}

#[cfg(test)]
mod tests {
    use super::padded_size;

    #[test]
    fn pads_to_eight_byte_boundary() {
        assert_eq!(padded_size(0), 0);
        assert_eq!(padded_size(1), 8);
        assert_eq!(padded_size(8), 8);
        assert_eq!(padded_size(9), 16);
        assert_eq!(padded_size(24), 24);
    }
}

use super::*;

#[test]
fn mul_div255_identity_edges() {
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(255, 0), 0);
}

#[test]
fn mul_div255_rounds_to_nearest() {
    // 128 * 128 / 255 = 64.25 -> 64
    assert_eq!(mul_div255_u16(128, 128), 64);
    assert_eq!(mul_div255_u8(255, 128), 128);
}

#[test]
fn lerp_endpoints() {
    assert_eq!(lerp_f64(2.0, 10.0, 0.0), 2.0);
    assert_eq!(lerp_f64(2.0, 10.0, 1.0), 10.0);
    assert_eq!(lerp_f64(2.0, 10.0, 0.5), 6.0);
}

//! End-to-end checks of the classifier: bytes in, PredictionResult out.

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use ndarray::{Array, Array1, Array2};
use neuroview_model::{Classifier, INPUT_LEN, ModelParameters, Scaler, TumorClass};
use std::io::Cursor;

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn mid_gray_png() -> Vec<u8> {
    encode(
        &DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([128]))),
        ImageFormat::Png,
    )
}

/// W1 averages every pixel into unit 0, W2 passes it through, W3 fans it out as 0,1,2,3.
fn reference_model() -> ModelParameters {
    ModelParameters::new(
        Array::from_shape_fn((INPUT_LEN, 8), |(_, j)| {
            if j == 0 { 1.0 / INPUT_LEN as f64 } else { 0.0 }
        }),
        Array1::zeros(8),
        Array2::eye(8),
        Array1::zeros(8),
        Array::from_shape_fn((8, 4), |(i, j)| if i == 0 { j as f64 } else { 0.0 }),
        Array1::zeros(4),
        Scaler::new(
            Array1::zeros(INPUT_LEN),
            Array1::from_elem(INPUT_LEN, 255.0),
        )
        .unwrap(),
    )
    .unwrap()
}

/// Arbitrary but fixed weights that exercise both LeakyReLU branches.
fn mixed_model() -> ModelParameters {
    ModelParameters::new(
        Array::from_shape_fn((INPUT_LEN, 16), |(i, j)| {
            (((i * 31 + j * 17) % 23) as f64 - 11.0) * 1e-3
        }),
        Array::from_shape_fn(16, |j| j as f64 * 0.05 - 0.4),
        Array::from_shape_fn((16, 8), |(i, j)| (((i * 7 + j * 3) % 11) as f64 - 5.0) * 0.1),
        Array::from_shape_fn(8, |j| 0.1 - j as f64 * 0.03),
        Array::from_shape_fn((8, 4), |(i, j)| (((i + 2 * j) % 5) as f64 - 2.0) * 0.3),
        Array1::from(vec![0.05, -0.05, 0.1, 0.0]),
        Scaler::new(
            Array1::from_elem(INPUT_LEN, 120.0),
            Array1::from_elem(INPUT_LEN, 60.0),
        )
        .unwrap(),
    )
    .unwrap()
}

fn sample_images() -> Vec<Vec<u8>> {
    vec![
        mid_gray_png(),
        encode(
            &DynamicImage::ImageRgb8(RgbImage::from_fn(64, 48, |x, y| {
                Rgb([(x * 4) as u8, (y * 5) as u8, ((x * y) % 256) as u8])
            })),
            ImageFormat::Png,
        ),
        encode(
            &DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([250, 10, 10]))),
            ImageFormat::Jpeg,
        ),
        encode(
            &DynamicImage::ImageLuma8(GrayImage::from_fn(20, 90, |x, _| Luma([(x * 12) as u8]))),
            ImageFormat::Bmp,
        ),
    ]
}

#[test]
fn mid_gray_matches_hand_computed_reference() {
    let classifier = Classifier::new(reference_model());
    let result = classifier.predict_bytes(&mid_gray_png());

    let expected = [
        0.10112195258714067,
        0.16704914058457318,
        0.2759580353830423,
        0.4558708714452439,
    ];
    assert!(result.success, "{:?}", result.error);
    for (got, want) in result.probabilities.iter().zip(expected.iter()) {
        assert!((got - want).abs() < 1e-9, "{got} != {want}");
    }
    assert_eq!(result.predicted_class, Some(3));
    assert_eq!(result.tumor_type, Some(TumorClass::Pituitary));
    assert_eq!(result.confidence, result.probabilities[3]);
}

#[test]
fn probabilities_sum_to_one_for_any_input() {
    for model in [reference_model(), mixed_model()] {
        let classifier = Classifier::new(model);
        for bytes in sample_images() {
            let result = classifier.predict_bytes(&bytes);
            assert!(result.success, "{:?}", result.error);
            let sum: f64 = result.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            assert!(result.probabilities.iter().all(|p| *p >= 0.0));
        }
    }
}

#[test]
fn reported_class_is_argmax_and_confidence_at_least_uniform() {
    let classifier = Classifier::new(mixed_model());
    for bytes in sample_images() {
        let result = classifier.predict_bytes(&bytes);
        let index = result.predicted_class.unwrap();
        let max = result
            .probabilities
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.probabilities[index], max);
        assert!(result.probabilities[..index].iter().all(|p| *p < max));
        assert_eq!(result.tumor_type, TumorClass::from_index(index));
        assert!(result.confidence >= 0.25);

        let ordered: Vec<_> = result.class_probabilities.iter().map(|(c, _)| c).collect();
        assert_eq!(ordered, TumorClass::ALL.to_vec());
    }
}

#[test]
fn zero_weights_are_decided_by_output_bias() {
    let bias = vec![0.0, 2.0, -1.0, 0.5];
    let classifier = Classifier::new(
        ModelParameters::new(
            Array2::zeros((INPUT_LEN, 8)),
            Array1::zeros(8),
            Array2::zeros((8, 8)),
            Array1::zeros(8),
            Array2::zeros((8, 4)),
            Array1::from(bias.clone()),
            Scaler::identity(INPUT_LEN),
        )
        .unwrap(),
    );

    let exp: Vec<f64> = bias.iter().map(|b| (b - 2.0f64).exp()).collect();
    let total: f64 = exp.iter().sum();
    for bytes in sample_images() {
        let result = classifier.predict_bytes(&bytes);
        for (got, e) in result.probabilities.iter().zip(exp.iter()) {
            assert!((got - e / total).abs() < 1e-12);
        }
        assert_eq!(result.tumor_type, Some(TumorClass::Meningioma));
    }
}

#[test]
fn same_bytes_give_bit_identical_results() {
    let classifier = Classifier::new(mixed_model());
    for bytes in sample_images() {
        let a = classifier.predict_bytes(&bytes);
        let b = classifier.predict_bytes(&bytes);
        assert_eq!(a, b);
        let bits_a: Vec<u64> = a.probabilities.iter().map(|p| p.to_bits()).collect();
        let bits_b: Vec<u64> = b.probabilities.iter().map(|p| p.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }
}

#[test]
fn malformed_bytes_produce_failure_result() {
    let classifier = Classifier::new(mixed_model());
    for bytes in [
        b"".to_vec(),
        b"definitely not an image".to_vec(),
        mid_gray_png()[..20].to_vec(),
    ] {
        let result = classifier.predict_bytes(&bytes);
        assert!(!result.success);
        assert!(!result.error_message().is_empty());
        assert_eq!(result.confidence, 0.0);
        assert!(result.probabilities.is_empty());
    }
}

#[test]
fn clones_share_one_model_across_threads() {
    let classifier = Classifier::new(mixed_model());
    let bytes = sample_images().remove(1);
    let expected = classifier.predict_bytes(&bytes);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let c = classifier.clone();
            let b = bytes.clone();
            std::thread::spawn(move || c.predict_bytes(&b))
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}

#[test]
fn loads_from_disk_and_predicts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("best_brain_nn_model.json");
    reference_model().save_json(&path).unwrap();

    let classifier = Classifier::load(&path).unwrap();
    let result = classifier.predict_bytes(&mid_gray_png());
    assert_eq!(result.tumor_type, Some(TumorClass::Pituitary));
}

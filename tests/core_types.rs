use detpost::{DetPostError, HeadLayout, ModelProfile, NmsMode, OwnedTensor, TensorView};

#[test]
fn tensor_view_rejects_invalid_dimensions() {
    let data = [0.0f32; 8];

    let err = TensorView::from_slice(&data, 0, 1, 1).err().unwrap();
    assert_eq!(
        err,
        DetPostError::InvalidDimensions {
            channels: 0,
            height: 1,
            width: 1,
        }
    );

    let err = TensorView::from_slice(&data, 2, 0, 1).err().unwrap();
    assert_eq!(
        err,
        DetPostError::InvalidDimensions {
            channels: 2,
            height: 0,
            width: 1,
        }
    );

    let err = TensorView::from_slice(&data, 2, 1, 0).err().unwrap();
    assert_eq!(
        err,
        DetPostError::InvalidDimensions {
            channels: 2,
            height: 1,
            width: 0,
        }
    );
}

#[test]
fn tensor_view_rejects_invalid_stride() {
    let data = [0.0f32; 16];

    let err = TensorView::new(&data, 4, 2, 2, 3).err().unwrap();
    assert_eq!(
        err,
        DetPostError::InvalidStride {
            channels: 4,
            stride: 3,
        }
    );
}

#[test]
fn tensor_view_rejects_small_buffer() {
    let data = [0.0f32; 11];

    // 3 channels over a 2x2 grid needs (4 - 1) * 3 + 3 = 12 elements.
    let err = TensorView::from_slice(&data, 3, 2, 2).err().unwrap();
    assert_eq!(err, DetPostError::BufferTooSmall { needed: 12, got: 11 });
}

#[test]
fn tensor_view_accepts_oversized_buffer() {
    let data = [1.0f32; 20];

    let view = TensorView::from_slice(&data, 3, 2, 2).unwrap();
    assert_eq!(view.channels(), 3);
    assert_eq!(view.height(), 2);
    assert_eq!(view.width(), 2);
    assert_eq!(view.stride(), 3);
    assert_eq!(view.sites(), 4);
}

#[test]
fn tensor_view_site_access_matches_layout() {
    let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let view = TensorView::from_slice(&data, 3, 2, 2).unwrap();

    assert_eq!(view.site(0, 0).unwrap(), &[0.0, 1.0, 2.0]);
    assert_eq!(view.site(0, 1).unwrap(), &[3.0, 4.0, 5.0]);
    assert_eq!(view.site(1, 0).unwrap(), &[6.0, 7.0, 8.0]);
    assert_eq!(view.site(1, 1).unwrap(), &[9.0, 10.0, 11.0]);
    assert_eq!(view.site_at(3).unwrap(), &[9.0, 10.0, 11.0]);

    assert_eq!(view.get(2, 0, 1), Some(5.0));
    assert_eq!(view.get(3, 0, 0), None);
    assert_eq!(view.site(2, 0), None);
    assert_eq!(view.site(0, 2), None);
    assert_eq!(view.site_at(4), None);
}

#[test]
fn tensor_view_strided_sites_skip_padding() {
    // 2 channels, 3 sites, stride 4: payload at 0..2, 4..6, 8..10.
    let data: Vec<f32> = (0..10).map(|v| v as f32).collect();
    let view = TensorView::new(&data, 2, 1, 3, 4).unwrap();

    assert_eq!(view.stride(), 4);
    assert_eq!(view.site_at(0).unwrap(), &[0.0, 1.0]);
    assert_eq!(view.site_at(1).unwrap(), &[4.0, 5.0]);
    assert_eq!(view.site_at(2).unwrap(), &[8.0, 9.0]);
}

#[test]
fn owned_tensor_requires_exact_length() {
    let err = OwnedTensor::from_vec(vec![0.0; 11], 3, 2, 2).err().unwrap();
    assert_eq!(
        err,
        DetPostError::BufferLengthMismatch {
            expected: 12,
            got: 11,
        }
    );

    let err = OwnedTensor::from_vec(vec![0.0; 13], 3, 2, 2).err().unwrap();
    assert_eq!(
        err,
        DetPostError::BufferLengthMismatch {
            expected: 12,
            got: 13,
        }
    );
}

#[test]
fn owned_tensor_view_round_trip() {
    let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let tensor = OwnedTensor::from_vec(data.clone(), 3, 2, 2).unwrap();

    assert_eq!(tensor.channels(), 3);
    assert_eq!(tensor.height(), 2);
    assert_eq!(tensor.width(), 2);
    assert_eq!(tensor.data(), data.as_slice());

    let view = tensor.view();
    assert_eq!(view.as_slice(), data.as_slice());
    assert_eq!(view.site(1, 1).unwrap(), &[9.0, 10.0, 11.0]);
}

#[test]
fn profile_registry_resolves_known_models() {
    let nanodet = ModelProfile::named("nanodet-m").unwrap();
    assert_eq!(nanodet.target_size, 320);
    assert_eq!(nanodet.reg_max, 8);
    assert_eq!(nanodet.num_classes, 80);
    assert!(matches!(nanodet.heads, HeadLayout::Grid { ref heads } if heads.len() == 3));

    let yolo = ModelProfile::named("yolov8s").unwrap();
    assert_eq!(yolo.target_size, 640);
    assert_eq!(yolo.reg_max, 16);
    assert!(matches!(yolo.heads, HeadLayout::Flat { .. }));

    assert!(ModelProfile::named("resnet50").is_none());
}

#[test]
fn profile_builders_override_thresholds() {
    let profile = ModelProfile::yolov8()
        .with_conf_threshold(0.5)
        .with_nms_threshold(0.6)
        .with_nms_mode(NmsMode::ClassAgnostic);

    assert_eq!(profile.conf_threshold, 0.5);
    assert_eq!(profile.nms_threshold, 0.6);
    assert_eq!(profile.nms_mode, NmsMode::ClassAgnostic);
    assert!(profile.validate().is_ok());
}

#[test]
fn profile_geometry_helpers() {
    let profile = ModelProfile::nanodet_m();
    assert_eq!(profile.input_len(), 3 * 320 * 320);
    assert_eq!(profile.feature_size(8), 40);
    assert_eq!(profile.feature_size(32), 10);
}

#[test]
fn profile_validation_rejects_bad_values() {
    let err = ModelProfile::nanodet_m()
        .with_conf_threshold(1.5)
        .validate()
        .err()
        .unwrap();
    assert_eq!(
        err,
        DetPostError::InvalidProfile {
            reason: "conf_threshold must be in [0, 1]",
        }
    );

    let err = ModelProfile::yolov8()
        .with_nms_threshold(1.0)
        .validate()
        .err()
        .unwrap();
    assert_eq!(
        err,
        DetPostError::InvalidProfile {
            reason: "nms_threshold must be in (0, 1)",
        }
    );

    let mut profile = ModelProfile::nanodet_m();
    profile.reg_max = 0;
    let err = profile.validate().err().unwrap();
    assert_eq!(
        err,
        DetPostError::InvalidProfile {
            reason: "reg_max must be at least 1",
        }
    );

    let mut profile = ModelProfile::nanodet_m();
    if let HeadLayout::Grid { heads } = &mut profile.heads {
        heads[0].stride = 7;
    }
    let err = profile.validate().err().unwrap();
    assert_eq!(
        err,
        DetPostError::InvalidProfile {
            reason: "head stride must divide target_size",
        }
    );

    let mut profile = ModelProfile::yolov8();
    profile.inputs.clear();
    let err = profile.validate().err().unwrap();
    assert_eq!(
        err,
        DetPostError::InvalidProfile {
            reason: "at least one input name is required",
        }
    );
}

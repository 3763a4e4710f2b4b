// lottery-data/src/registry_test.rs

use super::*;

fn hparams(name: &str) -> DatasetHparams {
    DatasetHparams::new(name, 32)
}

#[test]
fn test_dataset_kind_from_str() {
    for kind in DatasetKind::ALL {
        assert_eq!(kind.name().parse::<DatasetKind>().unwrap(), kind);
        assert_eq!(kind.to_string(), kind.name());
    }
    assert_eq!(
        "not_a_real_dataset".parse::<DatasetKind>(),
        Err(LotteryError::UnknownDataset("not_a_real_dataset".to_string()))
    );
    assert!("MNIST".parse::<DatasetKind>().is_err());
}

#[test]
fn test_iterations_for_subsampled_single_count() {
    let mut hp = hparams("cifar10");
    hp.subsample_fraction = Some(0.5);
    assert_eq!(iterations_for(&ExampleCount::Single(1000), &hp).unwrap(), 16);
}

#[test]
fn test_iterations_per_epoch_registered() {
    assert_eq!(iterations_per_epoch(&DatasetHparams::new("mnist", 128)).unwrap(), 469);
    assert_eq!(iterations_per_epoch(&DatasetHparams::new("cifar10", 128)).unwrap(), 391);
}

#[test]
fn test_iterations_per_epoch_domains() {
    let mut hp = DatasetHparams::new("domainnet", 100);
    assert_eq!(iterations_per_epoch(&hp).unwrap(), 4165);

    hp.domains = Some("clipart,real".to_string());
    // (34019 + 122563) / 100, rounded up.
    assert_eq!(iterations_per_epoch(&hp).unwrap(), 1566);

    hp.domains = Some("clipart,photos".to_string());
    assert_eq!(
        iterations_per_epoch(&hp),
        Err(LotteryError::UnknownDomain("photos".to_string()))
    );
}

#[test]
fn test_empty_domain_selection_is_rejected() {
    let mut hp = DatasetHparams::new("domainnet", 100);
    hp.domains = Some(",".to_string());
    assert!(matches!(
        iterations_per_epoch(&hp),
        Err(LotteryError::InvalidHparam { ref name, .. }) if name == "domains"
    ));
    assert!(matches!(
        get(&hp, &Platform::local(), true),
        Err(LotteryError::InvalidHparam { ref name, .. }) if name == "domains"
    ));
}

#[test]
fn test_single_count_ignores_domains() {
    let mut hp = hparams("mnist");
    hp.domains = Some("anything".to_string());
    assert_eq!(iterations_for(&ExampleCount::Single(64), &hp).unwrap(), 2);
}

#[test]
fn test_num_classes() {
    assert_eq!(num_classes(&hparams("cifar10")).unwrap(), 10);
    assert_eq!(num_classes(&hparams("imagenet")).unwrap(), 1000);
    assert_eq!(num_classes(&hparams("domainnet")).unwrap(), 345);
    for kind in DatasetKind::ALL {
        let mut hp = hparams(kind.name());
        hp.unsupervised_labels = Some("rotation".to_string());
        assert_eq!(num_classes(&hp).unwrap(), 4);
    }
    let mut hp = hparams("mnist");
    hp.unsupervised_labels = Some("jigsaw".to_string());
    assert_eq!(
        num_classes(&hp),
        Err(LotteryError::UnknownTransformMode("jigsaw".to_string()))
    );
    assert!(matches!(
        num_classes(&hparams("svhn")),
        Err(LotteryError::UnknownDataset(_))
    ));
}

#[test]
fn test_example_counts() {
    assert_eq!(
        num_train_examples(&hparams("imagenet")).unwrap(),
        ExampleCount::Single(1_281_167)
    );
    assert_eq!(num_test_examples(&hparams("imagenet")).unwrap().total(), 50_000);
    let domainnet = num_train_examples(&hparams("domainnet")).unwrap();
    assert_eq!(domainnet.total(), 416_401);
    assert_eq!(
        domainnet
            .for_domains(Some(&["sketch".to_string()][..]))
            .unwrap(),
        49_115
    );
}

#[test]
fn test_get_unknown_dataset_does_no_io() {
    let platform = Platform::local().with_dataset_root("/definitely/not/here");
    assert!(matches!(
        get(&hparams("not_a_real_dataset"), &platform, true),
        Err(LotteryError::UnknownDataset(_))
    ));
}

#[test]
fn test_get_validates_first() {
    let mut hp = hparams("not_a_real_dataset");
    hp.batch_size = 0;
    assert!(matches!(
        get(&hp, &Platform::local(), false),
        Err(LotteryError::InvalidHparam { .. })
    ));
}

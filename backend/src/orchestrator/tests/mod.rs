mod test_snapshot_validation;

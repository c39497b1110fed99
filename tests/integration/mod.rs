mod helpers;
mod test_clean_dir;
mod test_cli;
mod test_conformalize;
mod test_pre_commit;

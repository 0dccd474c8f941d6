pub const GITIGNORE: &str = "/.promptlab/\n*.db\n*.db-shm\n*.db-wal\n";

use std::env;
use std::path::PathBuf;

/// `~/.rpost`, falling back to the current directory when no home is set.
pub fn get_history_dir() -> PathBuf {
    home_dir().join(".rpost")
}

fn home_dir() -> PathBuf {
    if cfg!(windows) {
        env::var("USERPROFILE")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOMEDRIVE").ok().and_then(|drive| {
                    env::var("HOMEPATH").ok().map(|path| {
                        let mut p = PathBuf::from(drive);
                        p.push(path);
                        p
                    })
                })
            })
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        env::var("HOME")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

use std::path::{Component, Path, PathBuf};

/// resolves `.` and `..` components of a config path without touching the
/// file system. `..` never moves above the root
pub fn normalize<P>(path: P) -> PathBuf
where
    P: AsRef<Path>
{
    let mut parts: Vec<Component<'_>> = Vec::new();

    for comp in path.as_ref().components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) |
                Some(Component::Prefix(_)) => {}
                _ => parts.push(comp),
            },
            _ => parts.push(comp),
        }
    }

    parts.iter().map(|comp| comp.as_os_str()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolves_dots() {
        assert_eq!(normalize("/etc/disk/../disk/./config.yaml"), PathBuf::from("/etc/disk/config.yaml"));
        assert_eq!(normalize("/a/b/../../c"), PathBuf::from("/c"));
        assert_eq!(normalize("/../c"), PathBuf::from("/c"));
        assert_eq!(normalize("../settings.yaml"), PathBuf::from("../settings.yaml"));
    }
}

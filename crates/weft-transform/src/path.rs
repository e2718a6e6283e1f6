//! Component-relative resource path resolution.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use weft_core::{transform_fn, ServerConfig, Transform};

/// Contribute a `path` prop: the base every resource relative to the
/// component resolves against.
///
/// On the client this is the directory of the component's own URL. On a
/// detached server render the component lives on the filesystem instead, so
/// the public base is computed from the render options: the component
/// directory relative to the configured root, joined onto the configured
/// base URL.
pub fn path(component_url: impl Into<String>) -> Arc<dyn Transform> {
    let url: Arc<str> = Arc::from(component_url.into());

    transform_fn(move |props| {
        let url = Arc::clone(&url);
        async move {
            let base = match props.server_config() {
                Some(config) => server_base(&url, config),
                None => dir_of(&url).to_string(),
            };
            Ok(props.set("path", json!(base)))
        }
    })
}

/// Directory portion of a URL, trailing slash included.
fn dir_of(url: &str) -> &str {
    match url.rfind('/') {
        Some(index) => &url[..=index],
        None => "",
    }
}

fn server_base(url: &str, config: &ServerConfig) -> String {
    let local = url.strip_prefix("file://").unwrap_or(url);
    let dir = Path::new(local).parent().unwrap_or_else(|| Path::new(""));
    let relative = config
        .root
        .as_deref()
        .and_then(|root| dir.strip_prefix(root).ok())
        .unwrap_or(dir);

    let base = config.path.as_deref().unwrap_or("");
    let mut joined = join_url(base, &relative.to_string_lossy());
    if !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}

fn join_url(base: &str, relative: &str) -> String {
    let relative = relative.trim_matches('/');
    if relative.is_empty() {
        return base.trim_end_matches('/').to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::mpsc;
    use weft_core::{
        pipeline, Dispatcher, InstanceId, LifecycleRegistry, Props, PropsMap, RenderHandle,
        ResolvedProbe,
    };
    use weft_dom::{NodeId, NullSink};

    fn snapshot(
        lifecycle: &mut LifecycleRegistry,
        instance: InstanceId,
        server: Option<Arc<ServerConfig>>,
    ) -> Props {
        let (tx, _rx) = mpsc::unbounded_channel();
        lifecycle.initial_props(
            instance,
            PropsMap::new(),
            BTreeMap::new(),
            RenderHandle::new(instance, tx),
            Dispatcher::new(NodeId::next(), Arc::new(NullSink)),
            ResolvedProbe::resolved_now(),
            server,
        )
    }

    #[tokio::test]
    async fn test_client_path_is_component_directory() {
        let mut lifecycle = LifecycleRegistry::new();
        let instance = InstanceId::next();
        let transforms = vec![path("https://x/components/app/index.js")];

        let initial = snapshot(&mut lifecycle, instance, None);
        let props = pipeline::run(&mut lifecycle, instance, &transforms, initial)
            .await
            .unwrap();

        assert_eq!(props.get_str("path"), Some("https://x/components/app/"));
    }

    #[tokio::test]
    async fn test_server_path_resolves_against_root_and_base() {
        let mut lifecycle = LifecycleRegistry::new();
        let instance = InstanceId::next();
        let config = Arc::new(ServerConfig {
            path: Some("https://x/".to_string()),
            root: Some("/srv".into()),
        });
        let transforms = vec![path("file:///srv/components/app/index.js")];

        let initial = snapshot(&mut lifecycle, instance, Some(config));
        let props = pipeline::run(&mut lifecycle, instance, &transforms, initial)
            .await
            .unwrap();

        assert_eq!(props.get_str("path"), Some("https://x/components/app/"));
    }

    #[tokio::test]
    async fn test_server_path_outside_root_keeps_full_directory() {
        let mut lifecycle = LifecycleRegistry::new();
        let instance = InstanceId::next();
        let config = Arc::new(ServerConfig {
            path: Some("https://x".to_string()),
            root: Some("/elsewhere".into()),
        });
        let transforms = vec![path("file:///srv/app/index.js")];

        let initial = snapshot(&mut lifecycle, instance, Some(config));
        let props = pipeline::run(&mut lifecycle, instance, &transforms, initial)
            .await
            .unwrap();

        assert_eq!(props.get_str("path"), Some("https://x/srv/app/"));
    }
}

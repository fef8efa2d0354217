use proptest::prelude::*;
use sitepipe::globs::derive_globs;
use sitepipe::types::Category;
use sitepipe_test_utils::ManifestBuilder;

fn rel_path_strategy() -> impl Strategy<Value = String> {
    let dir = prop::sample::select(vec!["partials", "js", "css", "img", "docs", ".well-known"]);
    let stem = prop::sample::select(vec!["index", "app", "_vars", "favicon", "nav", ".htaccess"]);
    let ext = prop::sample::select(vec!["", ".js", ".scss", ".html", ".png", ".txt"]);

    (proptest::collection::vec(dir, 0..3), stem, ext)
        .prop_map(|(dirs, stem, ext)| {
            let mut parts: Vec<String> = dirs.into_iter().map(String::from).collect();
            parts.push(format!("{stem}{ext}"));
            parts.join("/")
        })
}

fn claiming(globs: &sitepipe::globs::DerivedGlobs, path: &str) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|&c| {
            let list = globs.source(c);
            list.has_includes() && list.compile().unwrap().matches(path)
        })
        .collect()
}

proptest! {
    #[test]
    fn every_source_file_has_exactly_one_category(rel in rel_path_strategy()) {
        let manifest = ManifestBuilder::site().favicon("favicon.png").build();
        let globs = derive_globs(&manifest);

        let path = format!("src/{rel}");
        let owners = claiming(&globs, &path);
        prop_assert_eq!(owners.len(), 1, "{} claimed by {:?}", path, owners);
    }

    #[test]
    fn without_a_catch_all_files_have_at_most_one_category(rel in rel_path_strategy()) {
        let manifest = ManifestBuilder::new()
            .script(&["**/*.js"])
            .style(&["**/*.scss", "css/**"])
            .markup(&["**/*.html"])
            .partials(&["partials/**"])
            .favicon("favicon.png")
            .build();
        let globs = derive_globs(&manifest);

        let path = format!("src/{rel}");
        let owners = claiming(&globs, &path);
        prop_assert!(owners.len() <= 1, "{} claimed by {:?}", path, owners);
    }

    #[test]
    fn favicon_output_belongs_to_the_favicon_category_only(rel in rel_path_strategy()) {
        let manifest = ManifestBuilder::site().favicon("favicon.png").build();
        let globs = derive_globs(&manifest);

        let path = format!("dist/favicons/{rel}");
        for category in Category::ALL {
            let Some(list) = globs.dist(category) else { continue };
            if !list.has_includes() {
                continue;
            }
            let matched = list.compile().unwrap().matches(&path);
            prop_assert_eq!(matched, category == Category::Favicon, "{} vs {}", path, category);
        }
    }
}

use std::io::Cursor;

use archive_kit::{Archive, ArchiveFormat, ArchiveFs, Asset, Filter, FsBackend, SharedArchive};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // RUST_LOG=archive_kit=debug shows every add, move and merge
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // a library jar, built in memory
    let mut lib = Archive::new("greeter.jar");
    lib.add(Asset::text("Greeter.class bytes"), "/org/acme/Greeter.class")?
        .add(Asset::service_provider(["org.acme.Greeter"])?, "/META-INF/services/org.acme.Api")?;
    let lib = SharedArchive::new(lib);

    // the application nests the library; it stays live after being added
    let mut app = Archive::new("app.war");
    app.add(Asset::text("<web-app/>"), "/WEB-INF/web.xml")?
        .add_archive(&lib, "/WEB-INF/lib", ArchiveFormat::Zip)?;
    lib.write().add(Asset::text("greeting=Hello"), "/greeter.properties")?;
    assert!(app.contains("/WEB-INF/lib/greeter.jar/greeter.properties"));

    // exported entries come out in the order they were added
    let bytes = app.export_to_vec(ArchiveFormat::Zip)?;
    let copy = Archive::import("copy.war", ArchiveFormat::Zip, Cursor::new(bytes))?;
    for (path, node) in copy.content() {
        println!("{:<10} {}", format!("{:?}", node.node_type()), path);
    }

    // keep only the deployment descriptors
    let descriptors = copy.filter(&Filter::include(r".*\.xml")?);
    println!("descriptors: {}", descriptors.len());

    // browse the live application like a filesystem
    let mut fs = ArchiveFs::new(SharedArchive::new(app));
    fs.cd("/WEB-INF/lib/greeter.jar")?;
    let greeting = String::from_utf8(fs.read("greeter.properties")?)?;
    println!("{greeting}");

    fs.cd("/")?;
    fs.mkfile("index.html", Some(b"<h1>Hello</h1>"))?;
    for path in fs.ls("/")? {
        println!("/ -> {path}");
    }

    Ok(())
}

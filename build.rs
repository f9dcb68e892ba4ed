#[cfg(windows)]
fn main() {
    let mut res = winres::WindowsResource::new();
    res.set("ProductName", "Mirage");
    res.set("FileDescription", "Mirage - Performance Monitor Overlay");
    res.set("LegalCopyright", "© 2025 Mirage Contributors");
    res.set("CompanyName", "Mirage");
    res.set("OriginalFilename", "mirage.exe");

    if let Err(e) = res.compile() {
        eprintln!("Failed to compile Windows resource: {}", e);
    }
}

#[cfg(not(windows))]
fn main() {
}

// Validation des fichiers uploadés (type MIME + taille)

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_PRODUCT_FILE_BYTES: usize = 50 * 1024 * 1024;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

const PRODUCT_FILE_TYPES: &[&str] = &[
    "application/pdf",
    "application/zip",
    "application/x-zip-compressed",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// Métadonnées d'un fichier reçu
#[derive(Debug, Clone, Copy)]
pub struct FileMeta<'a> {
    pub content_type: &'a str,
    pub size: usize,
}

/// None si le fichier est accepté, sinon le message à afficher
pub fn validate_image_file(file: FileMeta<'_>) -> Option<&'static str> {
    if !IMAGE_TYPES.contains(&file.content_type) {
        return Some("Please upload a valid image file (JPEG, PNG, GIF, or WebP)");
    }
    if file.size > MAX_IMAGE_BYTES {
        return Some("Image file size must be less than 5MB");
    }
    None
}

pub fn validate_product_file(file: FileMeta<'_>) -> Option<&'static str> {
    if !PRODUCT_FILE_TYPES.contains(&file.content_type) {
        return Some("Please upload a valid file (PDF, ZIP, DOC, DOCX, or TXT)");
    }
    if file.size > MAX_PRODUCT_FILE_BYTES {
        return Some("File size must be less than 50MB");
    }
    None
}

/// Extension du nom d'origine ("rapport.final.pdf" -> "pdf")
pub fn file_extension(file_name: &str) -> Option<&str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') {
        None
    } else {
        Some(ext)
    }
}

//! Back-office configuration, built once at startup and shared read-only.

/// One list screen of the back-office.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminScreen {
    pub name: &'static str,
    pub url: &'static str,
    /// Columns of the list view, in order.
    pub columns: &'static [&'static str],
}

#[derive(Clone, Debug)]
pub struct AdminSite {
    pub header: String,
    pub screens: Vec<AdminScreen>,
}

pub const SITE_HEADER: &str = "Automobile Portal Admin zone";

pub const CARS: AdminScreen = AdminScreen {
    name: "Автомобили",
    url: "/admin/cars/",
    columns: &["Марка", "Модель", "Год выпуска", "Владелец"],
};

pub const COMMENTS: AdminScreen = AdminScreen {
    name: "Комментарии",
    url: "/admin/comments/",
    columns: &["Автомобиль", "Автор", "Содержание"],
};

pub const USERS: AdminScreen = AdminScreen {
    name: "Пользователи",
    url: "/admin/users/",
    columns: &["Имя пользователя", "Email", "Персонал", "Активен"],
};

impl Default for AdminSite {
    fn default() -> Self {
        Self {
            header: SITE_HEADER.to_owned(),
            // Groups are not managed here.
            screens: vec![CARS, COMMENTS, USERS],
        }
    }
}

impl AdminSite {
    pub fn screen(&self, url: &str) -> Option<&AdminScreen> {
        self.screens.iter().find(|s| s.url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_site() {
        let site = AdminSite::default();
        assert_eq!(site.header, "Automobile Portal Admin zone");
        assert_eq!(site.screens.len(), 3);
        assert_eq!(site.screen("/admin/cars/"), Some(&CARS));
        assert!(site.screen("/admin/groups/").is_none());
    }
}
